use crate::KpartxOps;
use std::path::PathBuf;

/// RAII guard that removes the kpartx mappings of an image when dropped.
///
/// The guard is armed before the mappings are added: `kpartx -d` runs even when the add
/// step failed, and exactly once per guard.
#[derive(Debug)]
pub struct KpartxGuard<'a, H: KpartxOps + ?Sized> {
    hal: &'a H,
    image: PathBuf,
}

impl<'a, H: KpartxOps + ?Sized> KpartxGuard<'a, H> {
    pub fn new(hal: &'a H, image: impl Into<PathBuf>) -> Self {
        Self {
            hal,
            image: image.into(),
        }
    }
}

impl<'a, H: KpartxOps + ?Sized> Drop for KpartxGuard<'a, H> {
    fn drop(&mut self) {
        match self.hal.kpartx_delete(&self.image) {
            Ok(()) => log::info!("Removed loop devices for {}", self.image.display()),
            Err(err) => log::warn!(
                "kpartx guard failed to remove mappings for {}: {}",
                self.image.display(),
                err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FakeHal, Operation};
    use std::path::Path;

    #[test]
    fn kpartx_guard_detaches_on_drop() {
        let hal = FakeHal::new();
        let image = Path::new("/tmp/cedar.img");

        {
            let _guard = KpartxGuard::new(&hal, image);
            hal.kpartx_add(image).unwrap();
        }

        assert_eq!(
            hal.operations().last(),
            Some(&Operation::KpartxDelete {
                image: image.to_path_buf()
            })
        );
    }

    #[test]
    fn kpartx_guard_swallows_detach_failure() {
        let hal = FakeHal::new().failing("kpartx");

        {
            let _guard = KpartxGuard::new(&hal, "/tmp/broken.img");
        }

        assert_eq!(
            hal.count(|op| matches!(op, Operation::KpartxDelete { .. })),
            1
        );
    }
}
