#![forbid(unsafe_code)]

//! Release position → transfer intent.
//!
//! # Algorithm
//!
//! 1. Ask the [`SlotRegistry`] for the slot under the release point.
//! 2. Nothing there → world drop (`target: None`), unless the source is
//!    known to hold nothing, in which case the drag is a no-op.
//! 3. The source slot itself → silent cancel. A split dragged back onto its
//!    own slot is abandoned whole, never partially applied.
//! 4. Any other slot → transfer to it, carrying the arm-time split.
//!
//! The resolver only ever sees completed drags; clicks never reach it.

use tracing::debug;

use crate::geometry::Point;
use crate::gesture::{ActiveDrag, DragCancelReason};
use crate::item::ItemSnapshot;
use crate::registry::SlotRegistry;
use crate::slot::SlotAddress;

/// A single, unambiguous request to move (part of) a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    pub item: ItemSnapshot,
    pub source: SlotAddress,
    /// `None` drops the item into the world.
    pub target: Option<SlotAddress>,
    /// `None` moves the whole stack.
    pub split_quantity: Option<u32>,
}

impl TransferIntent {
    #[must_use]
    pub const fn is_world_drop(&self) -> bool {
        self.target.is_none()
    }

    /// How many units this intent moves.
    #[must_use]
    pub fn moved_quantity(&self) -> u32 {
        self.split_quantity.unwrap_or(self.item.quantity)
    }
}

/// Outcome of resolving one completed drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Transfer(TransferIntent),
    Cancelled(DragCancelReason),
}

/// Stateless drop-target resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferResolver;

impl TransferResolver {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve a completed drag released at `release_pos`.
    #[must_use]
    pub fn resolve(
        &self,
        drag: &ActiveDrag,
        release_pos: Point,
        registry: &SlotRegistry,
    ) -> Resolution {
        let source = &drag.source;
        match registry.resolve_at(release_pos) {
            None => {
                if drag.item.quantity == 0 || registry.is_known_empty(source) {
                    debug!(%source, "world drop from empty source ignored");
                    return Resolution::Cancelled(DragCancelReason::SourceEmpty);
                }
                Resolution::Transfer(TransferIntent {
                    item: drag.item.clone(),
                    source: source.clone(),
                    target: None,
                    split_quantity: drag.split_quantity,
                })
            }
            Some(target) if &target == source => {
                debug!(%source, split = ?drag.split_quantity, "dropped on source slot; cancelled");
                Resolution::Cancelled(DragCancelReason::SameSlot)
            }
            Some(target) => Resolution::Transfer(TransferIntent {
                item: drag.item.clone(),
                source: source.clone(),
                target: Some(target),
                split_quantity: drag.split_quantity,
            }),
        }
    }
}
