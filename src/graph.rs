//! Force-directed layout of the note graph.
//!
//! Every note becomes a node and every link whose endpoints both exist
//! becomes an edge. [`Simulation::tick`] advances the layout by one fixed
//! step, combining four forces in this order:
//!
//! 1. link: pulls linked nodes toward a separation of 100 units
//! 2. charge: every pair of nodes repels with strength −300
//! 3. center: shifts the layout so its mean position is the viewport center
//! 4. collision: keeps nodes at least `size + 10` apart
//!
//! The simulation cools as `alpha` decays toward `alpha_target` and stops
//! on its own once `alpha` drops below `alpha_min`. Dragging a node pins it
//! and raises `alpha_target` so the rest of the graph reacts.
use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::{Link, Note};

pub const NODE_COLOR: &str = "#0ea5e9";
pub const MIN_NODE_SIZE: f64 = 20.0;
pub const LINK_DISTANCE: f64 = 100.0;
pub const CHARGE_STRENGTH: f64 = -300.0;
pub const COLLISION_PADDING: f64 = 10.0;
pub const ALPHA_MIN: f64 = 0.001;
/// Alpha target held while at least one node is dragged
pub const DRAG_ALPHA_TARGET: f64 = 0.3;

/// Share of velocity kept between ticks
const VELOCITY_RETENTION: f64 = 0.6;
const DISTANCE_MIN2: f64 = 1.0;
const COLLISION_STRENGTH: f64 = 1.0;
/// Ticks needed to cool from 1 to `ALPHA_MIN` with no target
const COOLING_TICKS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Link,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// Visual radius
    pub size: f64,
    pub color: String,
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    pub vx: f64,
    #[serde(skip)]
    pub vy: f64,
    /// Pinned position while dragged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fy: Option<f64>,
}

impl GraphNode {
    fn from_note(note: &Note, x: f64, y: f64) -> Self {
        let size = (note.content.chars().count() as f64 / 100.0).max(MIN_NODE_SIZE);
        GraphNode {
            id: note.id.clone(),
            label: note.title.clone(),
            kind: NodeKind::Note,
            size,
            color: NODE_COLOR.to_string(),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
        }
    }

    fn collision_radius(&self) -> f64 {
        self.size + COLLISION_PADDING
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Resolved edge with its per-link strength and bias
#[derive(Debug, Clone, Copy)]
struct Spring {
    source: usize,
    target: usize,
    strength: f64,
    bias: f64,
}

/// Builds a simulation over `notes` and `links`.
///
/// Returns `None` when there are no notes. Nodes start at uniformly random
/// positions inside `viewport`, drawn from a generator seeded with `seed`.
pub fn build_simulation<'a, I>(
    notes: I,
    links: &[Link],
    viewport: Viewport,
    seed: u64,
) -> Option<Simulation>
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let nodes: Vec<GraphNode> = notes
        .into_iter()
        .map(|note| {
            let x = rng.gen::<f64>() * viewport.width;
            let y = rng.gen::<f64>() * viewport.height;
            GraphNode::from_note(note, x, y)
        })
        .collect();

    if nodes.is_empty() {
        debug!("No notes to lay out; not starting a simulation");
        return None;
    }

    Some(Simulation::new(nodes, links, viewport, rng))
}

pub struct Simulation {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    springs: Vec<Spring>,
    index: HashMap<String, usize>,
    viewport: Viewport,
    alpha: f64,
    alpha_min: f64,
    alpha_decay: f64,
    alpha_target: f64,
    running: bool,
    dragging: HashSet<usize>,
    ticks: u64,
    rng: StdRng,
}

impl Simulation {
    fn new(nodes: Vec<GraphNode>, links: &[Link], viewport: Viewport, rng: StdRng) -> Self {
        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();

        let mut edges = Vec::new();
        let mut resolved = Vec::new();
        for link in links {
            match (index.get(&link.source_id), index.get(&link.target_id)) {
                (Some(&source), Some(&target)) => {
                    edges.push(GraphEdge {
                        source: link.source_id.clone(),
                        target: link.target_id.clone(),
                        kind: EdgeKind::Link,
                        weight: 1.0,
                    });
                    resolved.push((source, target));
                }
                _ => trace!(
                    "Dropping dangling edge {} -> {}",
                    link.source_id,
                    link.target_id
                ),
            }
        }

        let mut degree = vec![0usize; nodes.len()];
        for &(source, target) in &resolved {
            degree[source] += 1;
            degree[target] += 1;
        }
        let springs = resolved
            .into_iter()
            .map(|(source, target)| {
                let (ds, dt) = (degree[source] as f64, degree[target] as f64);
                Spring {
                    source,
                    target,
                    strength: 1.0 / ds.min(dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect();

        debug!(
            "Simulation built with {} nodes and {} edges",
            nodes.len(),
            edges.len()
        );

        Simulation {
            nodes,
            edges,
            springs,
            index,
            viewport,
            alpha: 1.0,
            alpha_min: ALPHA_MIN,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / COOLING_TICKS),
            alpha_target: 0.0,
            running: true,
            dragging: HashSet::new(),
            ticks: 0,
            rng,
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    /// Ticks applied so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// True once the simulation has cooled down or was stopped
    pub fn is_settled(&self) -> bool {
        !self.running
    }

    pub fn positions(&self) -> Vec<NodePosition> {
        self.nodes
            .iter()
            .map(|node| NodePosition {
                id: node.id.clone(),
                x: node.x,
                y: node.y,
            })
            .collect()
    }

    /// Resumes ticking from the current alpha
    pub fn restart(&mut self) {
        self.running = true;
    }

    /// Puts full energy back into the layout and resumes ticking
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
        self.running = true;
    }

    /// Stops ticking; `step` and `advance` do nothing until restarted
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Applies one tick if the simulation is running.
    ///
    /// Stops the simulation when alpha falls below `alpha_min`.
    pub fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.tick();
        if self.alpha < self.alpha_min {
            debug!("Simulation cooled after {} ticks", self.ticks);
            self.running = false;
        }
        true
    }

    /// Steps up to `max_ticks` times and returns how many ticks ran
    pub fn advance(&mut self, max_ticks: usize) -> usize {
        let mut ran = 0;
        while ran < max_ticks && self.step() {
            ran += 1;
        }
        ran
    }

    /// Applies one fixed step regardless of alpha
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        apply_link_force(&mut self.nodes, &self.springs, alpha, &mut self.rng);
        apply_charge_force(&mut self.nodes, alpha, &mut self.rng);
        apply_center_force(&mut self.nodes, self.viewport.center());
        apply_collision_force(&mut self.nodes, &mut self.rng);

        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= VELOCITY_RETENTION;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= VELOCITY_RETENTION;
                    node.y += node.vy;
                }
            }
        }

        self.ticks += 1;
    }

    /// Pins a node at its current position for the duration of a drag.
    ///
    /// The first active drag reheats the simulation. Unknown ids are ignored.
    pub fn drag_start(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };

        if self.dragging.is_empty() {
            self.alpha_target = DRAG_ALPHA_TARGET;
            self.restart();
        }
        self.dragging.insert(i);

        let node = &mut self.nodes[i];
        node.fx = Some(node.x);
        node.fy = Some(node.y);
        trace!("Drag started on {}", id);
        true
    }

    /// Moves the pin of a node that is being dragged
    pub fn drag_to(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.index.get(id) {
            Some(&i) if self.dragging.contains(&i) => {
                self.nodes[i].fx = Some(x);
                self.nodes[i].fy = Some(y);
                true
            }
            _ => false,
        }
    }

    /// Releases a dragged node back into the simulation.
    ///
    /// When the last drag ends the simulation is allowed to cool again.
    pub fn drag_end(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        if !self.dragging.remove(&i) {
            return false;
        }

        self.nodes[i].fx = None;
        self.nodes[i].fy = None;
        if self.dragging.is_empty() {
            self.alpha_target = 0.0;
        }
        trace!("Drag ended on {}", id);
        true
    }
}

fn jiggle(rng: &mut StdRng) -> f64 {
    (rng.gen::<f64>() - 0.5) * 1e-6
}

fn apply_link_force(nodes: &mut [GraphNode], springs: &[Spring], alpha: f64, rng: &mut StdRng) {
    for spring in springs {
        let (s, t) = (spring.source, spring.target);
        let mut x = nodes[t].x + nodes[t].vx - nodes[s].x - nodes[s].vx;
        let mut y = nodes[t].y + nodes[t].vy - nodes[s].y - nodes[s].vy;
        if x == 0.0 {
            x = jiggle(rng);
        }
        if y == 0.0 {
            y = jiggle(rng);
        }

        let distance = (x * x + y * y).sqrt();
        let k = (distance - LINK_DISTANCE) / distance * alpha * spring.strength;
        x *= k;
        y *= k;

        nodes[t].vx -= x * spring.bias;
        nodes[t].vy -= y * spring.bias;
        nodes[s].vx += x * (1.0 - spring.bias);
        nodes[s].vy += y * (1.0 - spring.bias);
    }
}

// exact pairwise many-body; note counts stay in the low thousands
fn apply_charge_force(nodes: &mut [GraphNode], alpha: f64, rng: &mut StdRng) {
    let weight = CHARGE_STRENGTH * alpha;
    for i in 0..nodes.len() {
        let (xi, yi) = (nodes[i].x, nodes[i].y);
        let (mut vx, mut vy) = (0.0, 0.0);

        for (j, other) in nodes.iter().enumerate() {
            if i == j {
                continue;
            }
            let mut dx = other.x - xi;
            let mut dy = other.y - yi;
            if dx == 0.0 {
                dx = jiggle(rng);
            }
            if dy == 0.0 {
                dy = jiggle(rng);
            }
            let mut l = dx * dx + dy * dy;
            if l < DISTANCE_MIN2 {
                l = (DISTANCE_MIN2 * l).sqrt();
            }
            vx += dx * weight / l;
            vy += dy * weight / l;
        }

        nodes[i].vx += vx;
        nodes[i].vy += vy;
    }
}

fn apply_center_force(nodes: &mut [GraphNode], (cx, cy): (f64, f64)) {
    let n = nodes.len() as f64;
    let (sx, sy) = nodes
        .iter()
        .fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
    let (dx, dy) = (sx / n - cx, sy / n - cy);

    for node in nodes.iter_mut() {
        node.x -= dx;
        node.y -= dy;
    }
}

fn apply_collision_force(nodes: &mut [GraphNode], rng: &mut StdRng) {
    for i in 0..nodes.len() {
        let ri = nodes[i].collision_radius();
        let ri2 = ri * ri;
        let xi = nodes[i].x + nodes[i].vx;
        let yi = nodes[i].y + nodes[i].vy;

        for j in (i + 1)..nodes.len() {
            let rj = nodes[j].collision_radius();
            let r = ri + rj;
            let mut x = xi - nodes[j].x - nodes[j].vx;
            let mut y = yi - nodes[j].y - nodes[j].vy;
            let mut l = x * x + y * y;
            if l >= r * r {
                continue;
            }

            if x == 0.0 {
                x = jiggle(rng);
                l += x * x;
            }
            if y == 0.0 {
                y = jiggle(rng);
                l += y * y;
            }
            let distance = l.sqrt();
            let k = (r - distance) / distance * COLLISION_STRENGTH;
            x *= k;
            y *= k;

            let rj2 = rj * rj;
            let share = rj2 / (ri2 + rj2);
            nodes[i].vx += x * share;
            nodes[i].vy += y * share;
            nodes[j].vx -= x * (1.0 - share);
            nodes[j].vy -= y * (1.0 - share);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinkType, NoteDraft};

    fn note(title: &str, content_len: usize) -> Note {
        Note::new(NoteDraft {
            title: Some(title.to_string()),
            content: Some("x".repeat(content_len)),
            ..Default::default()
        })
    }

    fn link(source: &Note, target: &Note) -> Link {
        Link {
            source_id: source.id.clone(),
            target_id: target.id.clone(),
            link_type: LinkType::Internal,
            label: None,
        }
    }

    fn distance(a: &GraphNode, b: &GraphNode) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    const VIEWPORT: Viewport = Viewport {
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn zero_notes_builds_no_simulation() {
        let notes: Vec<Note> = Vec::new();
        assert!(build_simulation(&notes, &[], VIEWPORT, 7).is_none());
    }

    #[test]
    fn builds_one_node_per_note_and_drops_dangling_edges() {
        let a = note("A", 0);
        let b = note("B", 5000);
        let links = vec![
            link(&a, &b),
            Link {
                target_id: "deleted".to_string(),
                ..link(&a, &b)
            },
        ];
        let notes = vec![a.clone(), b.clone()];
        let sim = build_simulation(&notes, &links, VIEWPORT, 1).expect("simulation");

        assert_eq!(sim.nodes().len(), 2);
        assert_eq!(sim.node(&a.id).map(|n| n.size), Some(MIN_NODE_SIZE));
        assert_eq!(sim.node(&b.id).map(|n| n.size), Some(50.0));
        assert_eq!(sim.node(&a.id).map(|n| n.label.as_str()), Some("A"));
        assert_eq!(sim.edges().len(), 1);
        assert_eq!(sim.edges()[0].weight, 1.0);
        for node in sim.nodes() {
            assert!((0.0..800.0).contains(&node.x));
            assert!((0.0..600.0).contains(&node.y));
            assert_eq!(node.color, NODE_COLOR);
        }
    }

    #[test]
    fn same_seed_gives_same_layout() {
        let notes: Vec<Note> = (0..6).map(|i| note(&format!("n{}", i), i * 10)).collect();
        let links = vec![link(&notes[0], &notes[1]), link(&notes[1], &notes[2])];

        let mut first = build_simulation(&notes, &links, VIEWPORT, 42).expect("simulation");
        let mut second = build_simulation(&notes, &links, VIEWPORT, 42).expect("simulation");
        first.advance(50);
        second.advance(50);

        assert_eq!(first.positions(), second.positions());
    }

    #[test]
    fn cools_down_in_about_three_hundred_ticks() {
        let notes: Vec<Note> = (0..4).map(|i| note(&format!("n{}", i), 0)).collect();
        let mut sim = build_simulation(&notes, &[], VIEWPORT, 3).expect("simulation");

        let ran = sim.advance(10_000);
        assert!((295..=305).contains(&ran), "ran {} ticks", ran);
        assert!(sim.is_settled());
        assert!(sim.alpha() < ALPHA_MIN);
        assert_eq!(sim.advance(10), 0);
    }

    #[test]
    fn settled_layout_is_centered_without_overlap() {
        let notes: Vec<Note> = (0..8).map(|i| note(&format!("n{}", i), 0)).collect();
        let links: Vec<Link> = notes.windows(2).map(|w| link(&w[0], &w[1])).collect();
        let mut sim = build_simulation(&notes, &links, VIEWPORT, 11).expect("simulation");
        sim.advance(1_000);

        let n = sim.nodes().len() as f64;
        let mean_x = sim.nodes().iter().map(|n| n.x).sum::<f64>() / n;
        let mean_y = sim.nodes().iter().map(|n| n.y).sum::<f64>() / n;
        assert!((mean_x - 400.0).abs() < 2.0);
        assert!((mean_y - 300.0).abs() < 2.0);

        let nodes = sim.nodes();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let min = nodes[i].collision_radius() + nodes[j].collision_radius();
                assert!(distance(&nodes[i], &nodes[j]) > min * 0.9);
            }
        }
    }

    #[test]
    fn linked_nodes_end_closer_than_unlinked_ones() {
        let notes: Vec<Note> = (0..3).map(|i| note(&format!("n{}", i), 0)).collect();
        let links = vec![link(&notes[0], &notes[1])];
        let mut sim = build_simulation(&notes, &links, VIEWPORT, 5).expect("simulation");
        sim.advance(1_000);

        let nodes = sim.nodes();
        let linked = distance(&nodes[0], &nodes[1]);
        assert!(linked < distance(&nodes[0], &nodes[2]));
        assert!(linked < distance(&nodes[1], &nodes[2]));
    }

    #[test]
    fn drag_pins_until_release() {
        let notes: Vec<Note> = (0..3).map(|i| note(&format!("n{}", i), 0)).collect();
        let links = vec![link(&notes[0], &notes[1])];
        let mut sim = build_simulation(&notes, &links, VIEWPORT, 9).expect("simulation");
        sim.advance(1_000);
        assert!(sim.is_settled());
        let id = notes[0].id.clone();

        assert!(sim.drag_start(&id));
        assert!(!sim.is_settled());
        assert_eq!(sim.alpha_target(), DRAG_ALPHA_TARGET);
        assert!(sim.drag_to(&id, 120.0, 80.0));
        for _ in 0..20 {
            assert!(sim.step());
            let node = sim.node(&id).expect("node");
            assert_eq!((node.x, node.y), (120.0, 80.0));
        }

        assert!(sim.drag_end(&id));
        assert_eq!(sim.alpha_target(), 0.0);
        let node = sim.node(&id).expect("node");
        assert_eq!((node.fx, node.fy), (None, None));

        sim.step();
        let node = sim.node(&id).expect("node");
        assert_ne!((node.x, node.y), (120.0, 80.0));
    }

    #[test]
    fn drag_ignores_unknown_or_idle_nodes() {
        let notes = vec![note("solo", 0)];
        let mut sim = build_simulation(&notes, &[], VIEWPORT, 2).expect("simulation");

        assert!(!sim.drag_start("nope"));
        assert!(!sim.drag_to(&notes[0].id, 1.0, 1.0));
        assert!(!sim.drag_end(&notes[0].id));
        assert_eq!(sim.alpha_target(), 0.0);
    }

    #[test]
    fn stopped_simulation_does_not_tick() {
        let notes = vec![note("a", 0), note("b", 0)];
        let mut sim = build_simulation(&notes, &[], VIEWPORT, 4).expect("simulation");
        sim.stop();

        assert!(!sim.step());
        assert_eq!(sim.advance(100), 0);
        assert_eq!(sim.ticks(), 0);

        sim.reheat();
        assert_eq!(sim.alpha(), 1.0);
        assert_eq!(sim.advance(5), 5);
    }
}
