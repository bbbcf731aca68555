use cedar_hal::{FakeHal, Operation};
use cedar_image::errors::CedarError;
use cedar_image::resize::{attach, resize_filesystem, ResizeOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

const IMAGE: &str = "/tmp/cedar-test.img";

fn opts() -> ResizeOptions {
    ResizeOptions {
        settle_delay: Duration::from_millis(1),
    }
}

fn deletes(hal: &FakeHal) -> usize {
    hal.count(|op| matches!(op, Operation::KpartxDelete { .. }))
}

#[test]
fn resize_runs_full_sequence_on_second_partition() {
    let hal = FakeHal::new();

    let report = resize_filesystem(&hal, Path::new(IMAGE), &opts()).expect("resize");

    let root = PathBuf::from("/dev/mapper/loop0p2");
    assert_eq!(report.root_device, root);
    assert_eq!(report.devices.devices(), ["loop0p1", "loop0p2"]);
    assert!(report.resize_stdout.contains("460800"));
    assert_eq!(
        hal.operations(),
        vec![
            Operation::KpartxAdd {
                image: PathBuf::from(IMAGE)
            },
            Operation::Settle {
                delay: Duration::from_millis(1)
            },
            Operation::E2fsck {
                device: root.clone()
            },
            Operation::Resize2fs { device: root },
            Operation::KpartxDelete {
                image: PathBuf::from(IMAGE)
            },
        ]
    );
}

#[test]
fn single_partition_image_fails_and_still_detaches() {
    let hal = FakeHal::new()
        .with_kpartx_output("add map loop4p1 (253:0): 0 2048000 linear 7:4 2048\n");

    let err = resize_filesystem(&hal, Path::new(IMAGE), &opts()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CedarError>(),
        Some(CedarError::TooFewPartitions { found: 1 })
    ));
    assert!(!hal.has_operation(|op| matches!(op, Operation::E2fsck { .. })));
    assert_eq!(deletes(&hal), 1);
}

#[test]
fn kpartx_failure_still_detaches_once() {
    let hal = FakeHal::new().failing("kpartx");

    let err = resize_filesystem(&hal, Path::new(IMAGE), &opts()).unwrap_err();

    assert!(format!("{:#}", err).contains("injected failure"));
    assert_eq!(deletes(&hal), 1);
}

#[test]
fn nonzero_fsck_is_not_fatal() {
    let hal = FakeHal::new().with_fsck_exit_code(Some(1));

    let report = resize_filesystem(&hal, Path::new(IMAGE), &opts()).expect("resize");

    assert_eq!(report.fsck_code, Some(1));
    assert!(hal.has_operation(|op| matches!(op, Operation::Resize2fs { .. })));
    assert_eq!(deletes(&hal), 1);
}

#[test]
fn resize2fs_failure_fails_and_detaches_once() {
    let hal = FakeHal::new().failing("resize2fs");

    let err = resize_filesystem(&hal, Path::new(IMAGE), &opts()).unwrap_err();

    assert!(format!("{:#}", err).contains("Failed to resize /dev/mapper/loop0p2"));
    assert_eq!(deletes(&hal), 1);
}

#[test]
fn e2fsck_failure_fails_and_detaches_once() {
    let hal = FakeHal::new().failing("e2fsck");

    let err = resize_filesystem(&hal, Path::new(IMAGE), &opts()).unwrap_err();

    assert!(format!("{:#}", err).contains("Failed to run e2fsck on /dev/mapper/loop0p2"));
    assert!(!hal.has_operation(|op| matches!(op, Operation::Resize2fs { .. })));
    assert_eq!(deletes(&hal), 1);
}

#[test]
fn attach_keeps_kpartx_order_for_larger_images() {
    let hal = FakeHal::new().with_kpartx_output(
        "add map loop11p1 (253:0): 0 1 linear 7:176 8192\n\
         add map loop11p2 (253:1): 0 1 linear 7:176 532480\n\
         add map loop11p3 (253:2): 0 1 linear 7:176 9000000\n",
    );

    let set = attach(&hal, Path::new(IMAGE)).expect("attach");

    assert_eq!(set.devices().len(), 3);
    assert_eq!(
        set.root_partition().unwrap(),
        PathBuf::from("/dev/mapper/loop11p2")
    );
}

#[test]
fn attach_with_no_mappings_reports_zero_found() {
    let hal = FakeHal::new().with_kpartx_output("");

    let err = attach(&hal, Path::new(IMAGE)).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CedarError>(),
        Some(CedarError::TooFewPartitions { found: 0 })
    ));
}
