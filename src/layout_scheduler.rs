// src/layout_scheduler.rs - Drives a graph simulation on a timer
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, error, info, trace};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::{NodePosition, Result, Simulation, SterlingError};

#[derive(Debug, Clone)]
pub struct LayoutSchedulerStatus {
    /// Whether the tick task is running
    pub is_running: bool,
    /// Whether the task is parked on a settled layout, waiting for a command
    pub is_idle: bool,
    /// Time between two ticks
    pub tick_interval: Duration,
}

#[derive(Debug, Clone)]
pub enum LayoutCommand {
    DragStart { id: String },
    DragMove { id: String, x: f64, y: f64 },
    DragEnd { id: String },
    /// Resume ticking after the layout has cooled
    Restart,
    /// Stop the tick task
    Stop,
}

pub struct LayoutScheduler {
    /// Simulation shared with the tick task
    simulation: Arc<Mutex<Simulation>>,

    /// Channel to send commands to the tick task
    command_tx: mpsc::Sender<LayoutCommand>,

    /// Latest positions, published after every tick
    positions_tx: Arc<watch::Sender<Vec<NodePosition>>>,

    /// Handle to the tick task
    scheduler_task: Option<JoinHandle<()>>,

    /// Set by the tick task while it waits on a settled layout
    idle: Arc<AtomicBool>,

    /// Current status of the scheduler
    status: LayoutSchedulerStatus,
}

impl LayoutScheduler {
    /// Create a scheduler that ticks `simulation` every `tick_interval`
    pub fn new(simulation: Simulation, tick_interval: Duration) -> Self {
        info!(
            "Initializing layout scheduler for {} nodes, tick every {:?}",
            simulation.nodes().len(),
            tick_interval
        );
        let (command_tx, _) = mpsc::channel(32);
        let (positions_tx, _) = watch::channel(simulation.positions());

        Self {
            simulation: Arc::new(Mutex::new(simulation)),
            command_tx,
            positions_tx: Arc::new(positions_tx),
            scheduler_task: None,
            idle: Arc::new(AtomicBool::new(true)),
            status: LayoutSchedulerStatus {
                is_running: false,
                is_idle: true,
                tick_interval,
            },
        }
    }

    /// Start ticking in a background task
    pub async fn start(&mut self) -> Result<()> {
        if self.scheduler_task.is_some() {
            debug!("Layout scheduler is already running");
            return Ok(());
        }
        info!("Starting layout scheduler...");

        let (command_tx, mut command_rx) = mpsc::channel(32);
        self.command_tx = command_tx;

        let simulation = Arc::clone(&self.simulation);
        let positions_tx = Arc::clone(&self.positions_tx);
        let tick_interval = self.status.tick_interval;

        let idle = Arc::clone(&self.idle);

        let task = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let settled = simulation.lock().await.is_settled();
                idle.store(settled, Ordering::SeqCst);

                // a cooled layout has nothing to tick; wait for a command
                if settled {
                    debug!("Layout settled; tick task idle until the next command");
                    let Some(cmd) = command_rx.recv().await else {
                        break;
                    };
                    if !apply_command(&mut *simulation.lock().await, cmd) {
                        break;
                    }
                    interval.reset();
                    continue;
                }

                tokio::select! {
                    _ = interval.tick() => {
                        let mut sim = simulation.lock().await;
                        if sim.step() {
                            positions_tx.send_replace(sim.positions());
                        }
                    }
                    cmd = command_rx.recv() => {
                        let Some(cmd) = cmd else {
                            break;
                        };
                        if !apply_command(&mut *simulation.lock().await, cmd) {
                            break;
                        }
                    }
                }
            }
            idle.store(true, Ordering::SeqCst);
        });

        self.scheduler_task = Some(task);
        self.status.is_running = true;

        Ok(())
    }

    /// Stop the tick task and wait for it to finish
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.scheduler_task.take() {
            if let Err(e) = self.command_tx.send(LayoutCommand::Stop).await {
                error!("Failed to send stop command to layout scheduler: {}", e);
                task.abort();
            }

            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    let message = format!("Failed to stop layout scheduler: {}", e);
                    error!("{}", message);
                    return Err(SterlingError::SchedulerError { message });
                }
            }

            self.status.is_running = false;
            info!("Layout scheduler stopped");
        } else {
            debug!("Layout scheduler is not running");
        }

        Ok(())
    }

    async fn send(&self, command: LayoutCommand) -> Result<()> {
        if !self.status.is_running {
            return Err(SterlingError::SchedulerError {
                message: "Layout scheduler is not running".to_string(),
            });
        }

        self.command_tx
            .send(command)
            .await
            .map_err(|e| SterlingError::SchedulerError {
                message: format!("Failed to send layout command: {}", e),
            })
    }

    pub async fn drag_start(&self, id: &str) -> Result<()> {
        self.send(LayoutCommand::DragStart { id: id.to_string() })
            .await
    }

    pub async fn drag_move(&self, id: &str, x: f64, y: f64) -> Result<()> {
        self.send(LayoutCommand::DragMove {
            id: id.to_string(),
            x,
            y,
        })
        .await
    }

    pub async fn drag_end(&self, id: &str) -> Result<()> {
        self.send(LayoutCommand::DragEnd { id: id.to_string() })
            .await
    }

    pub async fn restart(&self) -> Result<()> {
        self.send(LayoutCommand::Restart).await
    }

    /// Receiver that observes every published set of positions
    pub fn subscribe(&self) -> watch::Receiver<Vec<NodePosition>> {
        self.positions_tx.subscribe()
    }

    /// Shared handle to the simulation
    pub fn simulation(&self) -> Arc<Mutex<Simulation>> {
        Arc::clone(&self.simulation)
    }

    /// Get the current status of the layout scheduler
    pub fn get_status(&self) -> LayoutSchedulerStatus {
        LayoutSchedulerStatus {
            is_idle: self.idle.load(Ordering::SeqCst),
            ..self.status.clone()
        }
    }
}

/// Applies one command; returns `false` when the task should exit
fn apply_command(sim: &mut Simulation, cmd: LayoutCommand) -> bool {
    match cmd {
        LayoutCommand::DragStart { id } => {
            if !sim.drag_start(&id) {
                debug!("Ignoring drag start on unknown node {}", id);
            }
        }
        LayoutCommand::DragMove { id, x, y } => {
            if !sim.drag_to(&id, x, y) {
                trace!("Ignoring drag move on idle node {}", id);
            }
        }
        LayoutCommand::DragEnd { id } => {
            if !sim.drag_end(&id) {
                debug!("Ignoring drag end on idle node {}", id);
            }
        }
        LayoutCommand::Restart => sim.restart(),
        LayoutCommand::Stop => {
            sim.stop();
            info!("Layout scheduler stopping after {} ticks", sim.ticks());
            return false;
        }
    }
    true
}

impl Drop for LayoutScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.scheduler_task.take() {
            debug!("Aborting layout scheduler task on drop");
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_simulation, Link, LinkType, Note, NoteDraft, Viewport};

    fn simulation() -> (Simulation, Vec<Note>) {
        let notes: Vec<Note> = ["a", "b", "c"]
            .iter()
            .map(|title| {
                Note::new(NoteDraft {
                    title: Some(title.to_string()),
                    ..Default::default()
                })
            })
            .collect();
        let links = vec![Link {
            source_id: notes[0].id.clone(),
            target_id: notes[1].id.clone(),
            link_type: LinkType::Internal,
            label: None,
        }];
        let sim = build_simulation(&notes, &links, Viewport::new(400.0, 300.0), 8)
            .expect("simulation");
        (sim, notes)
    }

    #[tokio::test]
    async fn ticks_until_stopped() {
        let (sim, _) = simulation();
        let mut scheduler = LayoutScheduler::new(sim, Duration::from_millis(1));
        let mut positions = scheduler.subscribe();

        scheduler.start().await.expect("start");
        assert!(scheduler.get_status().is_running);
        positions.changed().await.expect("positions published");

        scheduler.stop().await.expect("stop");
        assert!(!scheduler.get_status().is_running);

        let shared = scheduler.simulation();
        let ticks = shared.lock().await.ticks();
        assert!(ticks > 0);

        time::sleep(Duration::from_millis(20)).await;
        let sim = shared.lock().await;
        assert_eq!(sim.ticks(), ticks);
        assert!(sim.is_settled());
    }

    #[tokio::test]
    async fn drag_commands_reach_the_simulation() {
        let (sim, notes) = simulation();
        let id = notes[0].id.clone();
        let mut scheduler = LayoutScheduler::new(sim, Duration::from_millis(1));
        scheduler.start().await.expect("start");

        scheduler.drag_start(&id).await.expect("drag start");
        scheduler.drag_move(&id, 10.0, 20.0).await.expect("drag move");
        time::sleep(Duration::from_millis(30)).await;
        {
            let shared = scheduler.simulation();
            let sim = shared.lock().await;
            let node = sim.node(&id).expect("node");
            assert_eq!((node.fx, node.fy), (Some(10.0), Some(20.0)));
            assert_eq!(sim.alpha_target(), crate::DRAG_ALPHA_TARGET);
        }

        scheduler.drag_end(&id).await.expect("drag end");
        time::sleep(Duration::from_millis(30)).await;
        {
            let shared = scheduler.simulation();
            let sim = shared.lock().await;
            assert_eq!(sim.node(&id).and_then(|n| n.fx), None);
            assert_eq!(sim.alpha_target(), 0.0);
        }

        scheduler.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn idles_once_settled_and_wakes_on_drag() {
        let (mut sim, notes) = simulation();
        sim.advance(10_000);
        assert!(sim.is_settled());
        let id = notes[0].id.clone();

        let mut scheduler = LayoutScheduler::new(sim, Duration::from_millis(1));
        scheduler.start().await.expect("start");
        time::sleep(Duration::from_millis(20)).await;
        assert!(scheduler.get_status().is_idle);

        let shared = scheduler.simulation();
        let cooled_ticks = shared.lock().await.ticks();
        time::sleep(Duration::from_millis(20)).await;
        assert_eq!(shared.lock().await.ticks(), cooled_ticks);

        scheduler.drag_start(&id).await.expect("drag start");
        time::sleep(Duration::from_millis(20)).await;
        assert!(!scheduler.get_status().is_idle);
        assert!(shared.lock().await.ticks() > cooled_ticks);

        scheduler.drag_end(&id).await.expect("drag end");
        scheduler.stop().await.expect("stop");
        assert!(scheduler.get_status().is_idle);
    }

    #[tokio::test]
    async fn commands_fail_when_not_running() {
        let (sim, notes) = simulation();
        let mut scheduler = LayoutScheduler::new(sim, Duration::from_millis(5));

        assert!(matches!(
            scheduler.drag_start(&notes[0].id).await,
            Err(SterlingError::SchedulerError { .. })
        ));
        scheduler.stop().await.expect("stopping an idle scheduler is fine");
    }
}
