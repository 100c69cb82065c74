//! Attach and pool tests against simulated boards
//!
//! No hardware required: every board is a `SimulatedTransport`.

use std::sync::Arc;
use std::thread;

use hfa_driver::prelude::*;
use hfa_driver::{attach_next, ResetReport};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn test_single_core_generic_board() {
    init_tracing();
    let mut reg = DeviceRegistry::new();
    let mut board = SimulatedTransport::new(Topology::new(1, 1, DeviceVariant::Generic));

    let dev = attach(&mut reg, 0, &mut board, &AttachConfig::default()).expect("attach");

    assert_eq!(dev.inflight_target(), 2);
    assert_eq!(dev.hash_loops(), 0);
    {
        let jobs = dev.jobs().unwrap();
        assert_eq!(jobs.capacity(), 2);
        assert_eq!(jobs.inactive_count(), 2);
        assert_eq!(jobs.active_count(), 0);
    }
    assert_eq!(dev.work().unwrap().len(), 2);
    let cores = dev.cores().unwrap();
    assert_eq!(cores.rows().count(), 1);
    assert!(cores.is_enabled(0, 0));
}

#[test]
fn test_variant_tuning_through_attach() {
    let cases = [
        (DeviceVariant::Generic, 8, 0),
        (DeviceVariant::ExpressAgx, 1, 1 << 26),
        (DeviceVariant::Virtex7, 8, 1 << 26),
        (DeviceVariant::Virtex7, 4, 1 << 30),
    ];
    let mut reg = DeviceRegistry::new();
    for (variant, cores, loops) in cases {
        let mut board = SimulatedTransport::new(Topology::new(1, cores, variant));
        let dev = attach_next(&mut reg, &mut board, &AttachConfig::default()).unwrap();
        assert_eq!(dev.hash_loops(), loops, "{variant:?} with {cores} cores");
        assert_eq!(dev.variant(), variant);
    }
    assert_eq!(reg.len(), 4);
}

#[test]
fn test_unknown_device_type_attaches_as_generic() {
    let mut reg = DeviceRegistry::new();
    let mut board = SimulatedTransport::from_report(ResetReport {
        chips: 2,
        cores_per_chip: 3,
        device_type: 9,
    });
    let dev = attach(&mut reg, 0, &mut board, &AttachConfig::default()).unwrap();
    assert_eq!(dev.variant(), DeviceVariant::Generic);
    assert_eq!(dev.inflight_target(), 12);
}

#[test]
fn test_sparse_registry_growth() {
    let mut reg = DeviceRegistry::new();
    let mut attached = Vec::new();
    for id in [0, 2, 5] {
        let mut board = SimulatedTransport::new(Topology::new(1, 2, DeviceVariant::Generic));
        let dev = attach(&mut reg, id, &mut board, &AttachConfig::default()).unwrap();
        attached.push(dev);
        assert!(Arc::ptr_eq(&reg.lookup(0).unwrap(), &attached[0]));
    }

    for id in [1, 3, 4] {
        assert!(reg.lookup(id).is_none());
    }
    for dev in &attached {
        assert!(Arc::ptr_eq(&reg.lookup(dev.id()).unwrap(), dev));
    }
}

#[test]
fn test_reset_failure_is_isolated() {
    let mut reg = DeviceRegistry::new();
    let mut good = SimulatedTransport::new(Topology::new(2, 4, DeviceVariant::Virtex7));
    let first = attach(&mut reg, 0, &mut good, &AttachConfig::default()).unwrap();
    let job = first.jobs().unwrap().acquire().unwrap();

    let mut bad = SimulatedTransport::new(Topology::MINIMAL).failing("no reply to OP_RESET");
    let err = attach(&mut reg, 1, &mut bad, &AttachConfig::default()).unwrap_err();
    assert!(matches!(err, HfaError::ResetFailed { device_id: 1, .. }));
    assert!(reg.lookup(1).is_none());

    // the running device is untouched
    let jobs = first.jobs().unwrap();
    assert_eq!(jobs.queue_of(job), Some(Queue::Active));
    assert_eq!(jobs.active_count(), 1);
}

#[test]
fn test_zero_core_board_attaches() {
    let mut reg = DeviceRegistry::new();
    let mut board = SimulatedTransport::new(Topology::new(0, 0, DeviceVariant::Generic));
    let dev = attach(&mut reg, 0, &mut board, &AttachConfig::default()).unwrap();
    assert_eq!(dev.inflight_target(), 0);
    assert!(dev.jobs().unwrap().acquire().is_none());
    assert!(reg.lookup(0).is_some());
}

#[test]
fn test_backpressure_caps_active_jobs() {
    let mut reg = DeviceRegistry::new();
    let mut board = SimulatedTransport::new(Topology::new(2, 3, DeviceVariant::Generic));
    let dev = attach(&mut reg, 0, &mut board, &AttachConfig::default()).unwrap();

    let mut jobs = dev.jobs().unwrap();
    let mut held = Vec::new();
    while dev.backpressure().admits(jobs.active_count()) {
        held.push(jobs.acquire().expect("admitted job must be available"));
    }
    assert_eq!(held.len(), dev.inflight_target());
    assert!(jobs.acquire().is_none());
    assert_eq!(jobs.inactive_count(), 0);

    for job in held {
        jobs.release(job).unwrap();
    }
    assert_eq!(jobs.inactive_count(), dev.inflight_target());
}

#[test]
fn test_dispatch_and_completion_threads() {
    let mut reg = DeviceRegistry::new();
    let mut board = SimulatedTransport::new(Topology::new(4, 8, DeviceVariant::Generic));
    let dev = attach(&mut reg, 0, &mut board, &AttachConfig::default()).unwrap();
    let total = dev.inflight_target();

    let (tx, rx) = std::sync::mpsc::channel::<JobId>();

    let producer = {
        let dev = Arc::clone(&dev);
        thread::spawn(move || {
            let mut sent = 0usize;
            while sent < 1_000 {
                let claimed = dev.jobs().unwrap().acquire();
                match claimed {
                    Some(job) => {
                        {
                            let mut jobs = dev.jobs().unwrap();
                            assert!(jobs.active_count() <= total);
                            let slot = job.index();
                            let j = jobs.job_mut(job).unwrap();
                            j.work_slot = Some(slot);
                        }
                        tx.send(job).unwrap();
                        sent += 1;
                    }
                    None => thread::yield_now(),
                }
            }
        })
    };

    let consumer = {
        let dev = Arc::clone(&dev);
        thread::spawn(move || {
            for job in rx {
                let mut jobs = dev.jobs().unwrap();
                jobs.release(job).unwrap();
                assert_eq!(jobs.active_count() + jobs.inactive_count(), total);
            }
        })
    };

    producer.join().unwrap();
    consumer.join().unwrap();

    let jobs = dev.jobs().unwrap();
    assert_eq!(jobs.active_count(), 0);
    assert_eq!(jobs.inactive_count(), total);
}

#[test]
fn test_summary_via_registry_lookup() {
    let mut reg = DeviceRegistry::new();
    let mut board = SimulatedTransport::new(Topology::new(3, 6, DeviceVariant::Virtex7));
    attach(&mut reg, 0, &mut board, &AttachConfig::default().with_baud_rate(460_800)).unwrap();

    let summary = reg.lookup(0).unwrap().summary().unwrap();
    assert_eq!(summary.inflight_target, 36);
    assert_eq!(summary.work_len, 36);
    assert_eq!(summary.inactive_jobs, 36);
    assert_eq!(summary.enabled_cores, 18);
    assert_eq!(summary.baud_rate, 460_800);
    assert_eq!(summary.hash_loops, 1 << 26);
}

#[test]
fn test_detach_drops_device() {
    let mut reg = DeviceRegistry::new();
    let mut board = SimulatedTransport::new(Topology::MINIMAL);
    let dev = attach(&mut reg, 0, &mut board, &AttachConfig::default()).unwrap();
    let weak = Arc::downgrade(&dev);
    drop(dev);

    assert!(weak.upgrade().is_some());
    reg.remove(0);
    assert!(weak.upgrade().is_none());
}
