//! Identity types shared by the 2D model and the 3D scene.
//!
//! Ids are plain integers handed out by their owning container. They are
//! never reused within one container, so a stale id simply fails to resolve.

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(n: u64) -> Self {
                $name(n)
            }

            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

define_id!(
    /// Identity of a 2D layer (including groups).
    LayerId
);
define_id!(
    /// Identity of a feature; unique within the map that created it.
    FeatureId
);
define_id!(
    /// Identity of a vector or tile source.
    SourceId
);
define_id!(
    /// Identity of a registered icon image.
    ImageId
);

/// Monotonic id allocator.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_raw(&mut self) -> u64 {
        if self.next == 0 {
            self.next = 1;
        }
        let n = self.next;
        self.next += 1;
        n
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureId, IdGen, LayerId};

    #[test]
    fn ids_display_with_type_name() {
        assert_eq!(LayerId::new(3).to_string(), "LayerId#3");
        assert_eq!(FeatureId(7).get(), 7);
    }

    #[test]
    fn id_gen_never_hands_out_zero() {
        let mut ids = IdGen::default();
        assert_eq!(ids.next_raw(), 1);
        assert_eq!(ids.next_raw(), 2);
    }
}
