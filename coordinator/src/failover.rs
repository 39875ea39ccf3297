use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::state::Coordinator;

/// Loop de tolerancia a fallos: cada `interval` devuelve a Idle las tareas
/// cuyo lease venció, sin esperar a que alguien consulte `done()`.
pub async fn run_lease_sweeper(state: Coordinator, interval: Duration) {
    loop {
        sleep(interval).await;
        sweep_once(&state);
    }
}

/// Una pasada del barrido. Devuelve cuántas tareas se recuperaron.
pub fn sweep_once(state: &Coordinator) -> usize {
    let reclaimed = state.reclaim_expired();
    if reclaimed > 0 {
        info!("failover: {} tareas vuelven a la cola por lease vencido", reclaimed);
    } else {
        debug!("failover: sin leases vencidos");
    }
    reclaimed
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Assignment;
    use std::path::PathBuf;

    #[test]
    fn sweep_once_reclaims_expired_leases() {
        let state = Coordinator::new(
            vec!["a.txt".to_string()],
            1,
            Duration::from_millis(1),
            PathBuf::from("."),
        );

        assert!(matches!(state.ask_task(), Assignment::Map(_)));
        assert_eq!(state.ask_task(), Assignment::NoTask);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(sweep_once(&state), 1);

        match state.ask_task() {
            Assignment::Map(spec) => {
                assert_eq!(spec.file_path, "a.txt");
                assert_eq!(spec.epoch, 2);
            }
            other => panic!("se esperaba el map reasignado, llegó {:?}", other),
        }
    }
}
