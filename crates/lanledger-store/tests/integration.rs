//! Integration tests for lanledger-store against on-disk and in-memory SQLite.

use lanledger_core::{DiscoveredDevice, MacAddress, Timestamp};
use lanledger_store::{DeviceStore, Reconciled};

fn ts(s: &str) -> Timestamp {
    s.parse().unwrap()
}

fn sighting(mac: &str, ip: &str, hostname: Option<&str>, vendor: &str) -> DiscoveredDevice {
    DiscoveredDevice {
        ip: ip.to_string(),
        hostname: hostname.map(String::from),
        mac: MacAddress::new(mac),
        vendor: vendor.to_string(),
    }
}

fn reconcile_one(store: &mut DeviceStore, device: &DiscoveredDevice, at: Timestamp) -> Reconciled {
    let mut batch = store.begin_pass().unwrap();
    let outcome = batch.reconcile(device, at).unwrap();
    batch.commit().unwrap();
    outcome
}

#[test]
fn test_first_sighting_creates_record() {
    let mut store = DeviceStore::open_in_memory().unwrap();
    let now = ts("2026-02-01 10:00:00");
    let device = sighting("AA:BB:CC:DD:EE:FF", "192.168.1.10", Some("host1"), "Acme Corp");

    assert_eq!(reconcile_one(&mut store, &device, now), Reconciled::Created);

    let record = store.get(&device.mac).unwrap().unwrap();
    assert_eq!(record.ip, "192.168.1.10");
    assert_eq!(record.hostname.as_deref(), Some("host1"));
    assert_eq!(record.vendor, "Acme Corp");
    assert_eq!(record.first_seen, now);
    assert_eq!(record.last_seen, now);
}

#[test]
fn test_resighting_updates_identity_and_clears_hostname() {
    let mut store = DeviceStore::open_in_memory().unwrap();
    let first = ts("2026-02-01 10:00:00");
    let later = ts("2026-02-01 11:00:00");

    reconcile_one(
        &mut store,
        &sighting("AA:BB:CC:DD:EE:FF", "192.168.1.10", Some("host1"), "Acme Corp"),
        first,
    );
    let outcome = reconcile_one(
        &mut store,
        &sighting("AA:BB:CC:DD:EE:FF", "192.168.1.20", None, "Other Vendor"),
        later,
    );
    assert_eq!(outcome, Reconciled::Updated);

    let record = store
        .get(&MacAddress::new("AA:BB:CC:DD:EE:FF"))
        .unwrap()
        .unwrap();
    assert_eq!(record.ip, "192.168.1.20");
    assert_eq!(record.hostname, None);
    assert_eq!(record.vendor, "Acme Corp");
    assert_eq!(record.first_seen, first);
    assert_eq!(record.last_seen, later);
}

#[test]
fn test_same_sighting_twice_is_idempotent() {
    let mut store = DeviceStore::open_in_memory().unwrap();
    let at = ts("2026-02-01 10:00:00");
    let device = sighting("11:22:33:44:55:66", "10.0.0.5", Some("tv"), "Samsung");

    reconcile_one(&mut store, &device, at);
    let once = store.list().unwrap();
    reconcile_one(&mut store, &device, at);
    let twice = store.list().unwrap();

    assert_eq!(once, twice);
}

#[test]
fn test_first_seen_is_stable_across_sightings() {
    let mut store = DeviceStore::open_in_memory().unwrap();
    let device = sighting("11:22:33:44:55:66", "10.0.0.5", None, "Samsung");
    let times = [
        "2026-02-01 10:00:00",
        "2026-02-01 10:05:00",
        "2026-02-02 09:00:00",
        "2026-02-03 23:59:59",
    ];

    for t in times {
        reconcile_one(&mut store, &device, ts(t));
        let record = store.get(&device.mac).unwrap().unwrap();
        assert_eq!(record.first_seen, ts(times[0]));
        assert_eq!(record.last_seen, ts(t));
    }
}

#[test]
fn test_one_record_per_distinct_mac() {
    let mut store = DeviceStore::open_in_memory().unwrap();
    let at = ts("2026-02-01 10:00:00");
    let macs = [
        "aa:00:00:00:00:01",
        "AA:00:00:00:00:01",
        "aa:00:00:00:00:02",
        "AA:00:00:00:00:03",
        "Aa:00:00:00:00:02",
        "aA:00:00:00:00:03",
    ];

    let mut batch = store.begin_pass().unwrap();
    for (i, mac) in macs.iter().enumerate() {
        batch
            .reconcile(&sighting(mac, &format!("10.0.0.{i}"), None, "Unknown"), at)
            .unwrap();
    }
    let stats = batch.commit().unwrap();

    assert_eq!(stats.created, 3);
    assert_eq!(stats.updated, 3);
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn test_back_to_back_creates_degrade_to_update() {
    let mut store = DeviceStore::open_in_memory().unwrap();
    let at = ts("2026-02-01 10:00:00");
    let device = sighting("DE:AD:BE:EF:00:01", "10.0.0.8", Some("cam"), "Axis");

    let mut batch = store.begin_pass().unwrap();
    assert_eq!(batch.reconcile(&device, at).unwrap(), Reconciled::Created);
    assert_eq!(batch.reconcile(&device, at).unwrap(), Reconciled::Updated);
    batch.commit().unwrap();

    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_uncommitted_batch_is_rolled_back() {
    let mut store = DeviceStore::open_in_memory().unwrap();
    let at = ts("2026-02-01 10:00:00");

    {
        let mut batch = store.begin_pass().unwrap();
        batch
            .reconcile(&sighting("01:02:03:04:05:06", "10.0.0.1", None, "Unknown"), at)
            .unwrap();
        assert!(batch
            .lookup(&MacAddress::new("01:02:03:04:05:06"))
            .unwrap()
            .is_some());
    }

    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_inventory_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nmap_devices.db");
    let device = sighting("AA:BB:CC:00:11:22", "192.168.1.50", Some("laptop"), "Dell");

    {
        let mut store = DeviceStore::open(&path).unwrap();
        reconcile_one(&mut store, &device, ts("2026-02-01 10:00:00"));
    }

    let mut store = DeviceStore::open(&path).unwrap();
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(
        reconcile_one(&mut store, &device, ts("2026-02-02 10:00:00")),
        Reconciled::Updated
    );

    let record = store.get(&device.mac).unwrap().unwrap();
    assert_eq!(record.first_seen, ts("2026-02-01 10:00:00"));
    assert_eq!(record.last_seen, ts("2026-02-02 10:00:00"));
}

#[test]
fn test_list_orders_by_last_seen_descending() {
    let mut store = DeviceStore::open_in_memory().unwrap();
    reconcile_one(
        &mut store,
        &sighting("00:00:00:00:00:01", "10.0.0.1", None, "A"),
        ts("2026-02-01 10:00:00"),
    );
    reconcile_one(
        &mut store,
        &sighting("00:00:00:00:00:02", "10.0.0.2", None, "B"),
        ts("2026-02-01 12:00:00"),
    );

    let records = store.list().unwrap();
    let macs: Vec<_> = records.iter().map(|r| r.mac.as_str()).collect();
    assert_eq!(macs, vec!["00:00:00:00:00:02", "00:00:00:00:00:01"]);
}
