use serde::Serialize;

use crate::compiler::semantics::WORD_SIZE;

/// Space a procedure reserves at the bottom of its frame for the arguments of
/// the procedures it calls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum OutgoingArea {
    /// The procedure makes no calls, so it neither reserves an area nor saves its
    /// return address.
    NoCalls,
    /// Size in bytes of the largest argument area among all callees.  This can be
    /// 0 if every callee takes no arguments.
    Size(i32),
}

impl OutgoingArea {
    pub fn size_or_zero(&self) -> i32 {
        match self {
            OutgoingArea::NoCalls => 0,
            OutgoingArea::Size(sz) => *sz,
        }
    }
}

/**
 The sizes of the three regions of a procedure's activation record.  Each size is
 `None` until the stack allocator has computed it.

 ```text
        |  arguments   |  FP + 0 .. argument_area_size
 FP ->  +--------------+
        |  locals      |  FP - 1 .. FP - local_var_area_size
        |  old RA      |  FP + old_return_address_offset
        |  old FP      |  SP + old_frame_pointer_offset
        |  outgoing    |  SP + 0 ..
 SP ->  +--------------+
 ```
*/
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StackLayout {
    pub argument_area_size: Option<i32>,
    pub local_var_area_size: Option<i32>,
    pub outgoing_area_size: Option<OutgoingArea>,
}

impl StackLayout {
    pub fn new() -> StackLayout {
        StackLayout {
            argument_area_size: None,
            local_var_area_size: None,
            outgoing_area_size: None,
        }
    }

    /// True if the procedure calls another procedure and therefore must save its
    /// return address.
    pub fn makes_calls(&self) -> bool {
        matches!(self.outgoing_area_size, Some(OutgoingArea::Size(_)))
    }

    /// Total number of bytes the prologue subtracts from the stack pointer.  `None`
    /// if the layout is incomplete or the frame does not fit into an `i32`.
    pub fn frame_size(&self) -> Option<i32> {
        let locals = self.local_var_area_size?;
        let outgoing = self.outgoing_area_size?;
        locals
            .checked_add(outgoing.size_or_zero())?
            .checked_add(2 * WORD_SIZE)
    }

    /// Where the caller's frame pointer is saved, relative to the new stack pointer.
    pub fn old_frame_pointer_offset(&self) -> Option<i32> {
        let outgoing = self.outgoing_area_size?;
        outgoing.size_or_zero().checked_add(WORD_SIZE)
    }

    /// Where the return address is saved, relative to the frame pointer.
    pub fn old_return_address_offset(&self) -> Option<i32> {
        let locals = self.local_var_area_size?;
        locals.checked_add(2 * WORD_SIZE).map(|size| -size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_layout_has_no_frame() {
        let mut layout = StackLayout::new();
        assert_eq!(layout.frame_size(), None);
        layout.local_var_area_size = Some(8);
        assert_eq!(layout.frame_size(), None);
        assert_eq!(layout.old_return_address_offset(), Some(-16));
        assert_eq!(layout.old_frame_pointer_offset(), None);
    }

    #[test]
    fn test_leaf_procedure_frame() {
        let layout = StackLayout {
            argument_area_size: Some(4),
            local_var_area_size: Some(20),
            outgoing_area_size: Some(OutgoingArea::NoCalls),
        };
        assert!(!layout.makes_calls());
        assert_eq!(layout.frame_size(), Some(28));
        assert_eq!(layout.old_frame_pointer_offset(), Some(4));
        assert_eq!(layout.old_return_address_offset(), Some(-28));
    }

    #[test]
    fn test_calling_procedure_frame() {
        let layout = StackLayout {
            argument_area_size: Some(0),
            local_var_area_size: Some(4),
            outgoing_area_size: Some(OutgoingArea::Size(12)),
        };
        assert!(layout.makes_calls());
        assert_eq!(layout.frame_size(), Some(24));
        assert_eq!(layout.old_frame_pointer_offset(), Some(16));
        assert_eq!(layout.old_return_address_offset(), Some(-12));
    }

    #[test]
    fn test_calls_without_arguments_still_save_return_address() {
        let layout = StackLayout {
            argument_area_size: Some(0),
            local_var_area_size: Some(0),
            outgoing_area_size: Some(OutgoingArea::Size(0)),
        };
        assert!(layout.makes_calls());
        assert_eq!(layout.frame_size(), Some(8));
    }

    #[test]
    fn test_oversized_frame_has_no_size() {
        let layout = StackLayout {
            argument_area_size: Some(0),
            local_var_area_size: Some(i32::MAX - 4),
            outgoing_area_size: Some(OutgoingArea::NoCalls),
        };
        assert_eq!(layout.frame_size(), None);
        assert_eq!(layout.old_return_address_offset(), None);
        assert_eq!(layout.old_frame_pointer_offset(), Some(4));
    }
}
