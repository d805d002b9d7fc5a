/*
Copyright 2017 Takashi Ogura

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::{cmp::Ordering, collections::BinaryHeap, f32::consts::SQRT_2, path::PathBuf};

use clap::Parser;
use nalgebra as na;
use openrr_grid_planner::{
    costmap::{MAX_NON_OBSTACLE, OCCUPIED},
    flatten_path, unflatten_path, Costmap, FirstOrderFunction, GridPlannerConfig,
    GridSearchConfig, MinimalCostmap, Neighborhood, Node2D, NodeGraph, SmootherCostFunction,
    SmootherParams,
};
use tracing::*;

#[derive(Debug, PartialEq)]
struct Queued {
    priority: f32,
    index: usize,
}

impl Eq for Queued {}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* over the node graph
fn search(
    graph: &mut NodeGraph,
    neighborhood: &Neighborhood,
    start: usize,
    goal: usize,
    config: &GridSearchConfig,
) -> Option<Vec<usize>> {
    let width = graph.width();
    let coords = |index: usize| {
        Node2D::coordinates_from_index(index, width, 1).expect("angle quantization is 1")
    };
    let goal_coords = coords(goal);

    let start_node = graph.node_mut(start)?;
    start_node.set_accumulated_cost(0.0);
    start_node.queued();
    let mut open = BinaryHeap::new();
    open.push(Queued {
        priority: Node2D::heuristic_cost(&coords(start), &goal_coords, config.neutral_cost),
        index: start,
    });

    let mut expanded = 0;
    while let Some(Queued { index, .. }) = open.pop() {
        let node = graph.node_mut(index)?;
        if node.was_visited() {
            continue;
        }
        node.visited();
        expanded += 1;
        if index == goal {
            info!("goal found after {expanded} expansions");
            return Some(graph.backtrace(goal));
        }
        let accumulated = graph.node(index)?.accumulated_cost();
        let neighbors =
            neighborhood.neighbors(index, |n| graph.valid_node(n, config.allow_unknown));
        for n in neighbors {
            let neighbor = graph.node_mut(n)?;
            if neighbor.was_visited() {
                continue;
            }
            let diagonal = n % width != index % width && n / width != index / width;
            let step = if diagonal { SQRT_2 } else { 1.0 };
            let candidate = accumulated + config.neutral_cost * step + neighbor.cost();
            if candidate < neighbor.accumulated_cost() {
                neighbor.set_accumulated_cost(candidate);
                neighbor.parent = Some(index);
                neighbor.queued();
                open.push(Queued {
                    priority: candidate
                        + Node2D::heuristic_cost(&coords(n), &goal_coords, config.neutral_cost),
                    index: n,
                });
            }
        }
    }
    warn!("no path after {expanded} expansions");
    None
}

/// Square obstacle in the middle of the map with a linearly decaying inflation
fn create_costmap(size: u32, resolution: f64) -> MinimalCostmap {
    let mut costmap = MinimalCostmap::new(size, size, resolution, na::Vector2::zeros())
        .expect("valid costmap size");
    let center = f64::from(size) / 2.0;
    let half_width = f64::from(size) / 8.0;
    let inflation = f64::from(size) / 8.0;
    for mx in 0..size {
        for my in 0..size {
            let dx = (f64::from(mx) + 0.5 - center).abs() - half_width;
            let dy = (f64::from(my) + 0.5 - center).abs() - half_width;
            let distance = dx.max(dy);
            let cost = if distance <= 0.0 {
                OCCUPIED
            } else if distance < inflation {
                (f64::from(MAX_NON_OBSTACLE) * (1.0 - distance / inflation)) as u8
            } else {
                continue;
            };
            costmap.set_cost(mx, my, cost);
        }
    }
    costmap
}

fn descend<F>(function: &F, parameters: &mut [f64], step: f64, iterations: usize)
where
    F: FirstOrderFunction,
{
    let mut gradient = vec![0.0; function.num_parameters()];
    for i in 0..iterations {
        let cost = function
            .evaluate(parameters, Some(&mut gradient))
            .expect("buffers have the right size");
        debug!("iteration {i}: cost = {cost}");
        for (x, g) in parameters.iter_mut().zip(&gradient) {
            *x -= step * g;
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "openrr_grid_planner_example")]
struct Opt {
    /// Number of cells of each side of the map
    #[arg(long, default_value_t = 40)]
    size: u32,
    /// Size of a cell [m]
    #[arg(long, default_value_t = 0.05)]
    resolution: f64,
    /// TOML file with `[search]` and `[smoother]` tables
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of gradient descent iterations
    #[arg(short, long, default_value_t = 200)]
    iterations: usize,
    /// Gradient descent step size
    #[arg(short, long, default_value_t = 0.001)]
    step: f64,
}

fn main() -> Result<(), openrr_grid_planner::Error> {
    tracing_subscriber::fmt::init();
    let opt = Opt::parse();

    let config = match &opt.config {
        Some(path) => GridPlannerConfig::try_new(path)?,
        None => GridPlannerConfig {
            smoother: SmootherParams {
                smooth_weight: 10.0,
                costmap_weight: 0.0002,
                curvature_weight: 0.1,
                distance_weight: 1.0,
                max_curvature: 2.5,
            },
            ..Default::default()
        },
    };
    info!("config = {config:?}");

    let costmap = create_costmap(opt.size, opt.resolution);
    let width = opt.size as usize;
    let mut graph = NodeGraph::new(costmap.costs(), width)?;
    let neighborhood = config.search.neighborhood(width)?;

    let start = Node2D::index_from_coordinates(1, 1, width);
    let goal = Node2D::index_from_coordinates(width - 2, width - 2, width);
    let Some(cells) = search(&mut graph, &neighborhood, start, goal, &config.search) else {
        println!("no path found");
        return Ok(());
    };

    let path = cells
        .iter()
        .map(|&index| {
            let coords = Node2D::coordinates_from_index(index, width, 1)?;
            Ok(costmap.map_to_world(coords.x as u32, coords.y as u32))
        })
        .collect::<Result<Vec<_>, openrr_grid_planner::Error>>()?;
    println!("grid path has {} points", path.len());

    let function = SmootherCostFunction::new(&path, &costmap, config.smoother.clone())?;
    let mut parameters = flatten_path(&path);
    println!("before: {:?}", function.cost_terms(&parameters)?);
    descend(&function, &mut parameters, opt.step, opt.iterations);
    println!("after:  {:?}", function.cost_terms(&parameters)?);

    for point in unflatten_path(&parameters)? {
        let cell = costmap
            .world_to_map(point.x, point.y)
            .map(|(mx, my)| costmap.cost(mx, my));
        println!("{:.3} {:.3} cost={cell:?}", point.x, point.y);
    }
    Ok(())
}
