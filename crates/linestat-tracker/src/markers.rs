// Side table from range ids to the renderer's marker handles.

use std::collections::HashMap;

use linestat_core::{MarkerHandle, RangeId};

#[derive(Debug, Default)]
pub(crate) struct MarkerTable {
    handles: HashMap<RangeId, MarkerHandle>,
}

impl MarkerTable {
    /// Record the marker for `id`. A second marker for the same id is a
    /// programming error: it is refused and handed back for disposal.
    pub(crate) fn attach(&mut self, id: RangeId, handle: MarkerHandle) -> Result<(), MarkerHandle> {
        debug_assert!(
            !self.handles.contains_key(&id),
            "marker already attached to range {:?}",
            id
        );
        if self.handles.contains_key(&id) {
            log::error!("marker already attached to range {:?}", id);
            return Err(handle);
        }
        self.handles.insert(id, handle);
        Ok(())
    }

    pub(crate) fn detach(&mut self, id: RangeId) -> Option<MarkerHandle> {
        self.handles.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_then_detach() {
        let mut table = MarkerTable::default();
        assert!(table.attach(RangeId(1), MarkerHandle(10)).is_ok());
        assert_eq!(table.len(), 1);
        assert_eq!(table.detach(RangeId(1)), Some(MarkerHandle(10)));
        assert_eq!(table.detach(RangeId(1)), None);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "already attached"))]
    fn double_attach_is_refused() {
        let mut table = MarkerTable::default();
        table.attach(RangeId(1), MarkerHandle(10)).unwrap();
        assert_eq!(table.attach(RangeId(1), MarkerHandle(11)), Err(MarkerHandle(11)));
        assert_eq!(table.detach(RangeId(1)), Some(MarkerHandle(10)));
    }
}
