use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use time::OffsetDateTime;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Dernier résultat de sonde connu pour une adresse du parc.
/// Alimenté uniquement à la demande (ping unitaire ou scan de plage),
/// jamais par une tâche de fond.
#[derive(Debug, Clone, Copy)]
pub struct ProbeStatus {
    pub online: bool,
    pub checked_at: OffsetDateTime,
}

pub type StatusMap = HashMap<Ipv4Addr, ProbeStatus>;

pub fn record_probe(statuses: &Shared<StatusMap>, ip: Ipv4Addr, online: bool) {
    statuses.lock().insert(
        ip,
        ProbeStatus {
            online,
            checked_at: OffsetDateTime::now_utc(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_probe_overwrites_previous_outcome() {
        let statuses = new_state(StatusMap::new());
        let ip = Ipv4Addr::new(192, 168, 10, 2);

        record_probe(&statuses, ip, true);
        assert!(statuses.lock().get(&ip).unwrap().online);

        record_probe(&statuses, ip, false);
        assert!(!statuses.lock().get(&ip).unwrap().online);
        assert_eq!(statuses.lock().len(), 1);
    }
}
