//! C-compatible memory layout computation.
//!
//! The generator needs concrete sizes for two things: the parameter-block size
//! a call site asks for at resolution time, and the size/offset assertions
//! emitted for blittable types on both sides of the boundary. Both follow the
//! platform C layout rules (`#[repr(C)]` on the managed side).

/// Target properties that differ between platforms the stubs are generated
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetLayout {
    pub pointer_size: usize,
    /// Alignment of 8-byte scalars (`i64`, `u64`, `f64`). 4 on 32-bit x86
    /// System V targets, 8 elsewhere.
    pub wide_align: usize,
}

impl TargetLayout {
    /// A target with the given pointer size and 8-byte aligned wide scalars.
    pub const fn with_pointer_size(pointer_size: usize) -> Self {
        Self {
            pointer_size,
            wide_align: 8,
        }
    }

    /// The layout of the platform running the generator.
    pub fn host() -> Self {
        Self {
            pointer_size: std::mem::size_of::<usize>(),
            wide_align: std::mem::align_of::<u64>(),
        }
    }
}

impl Default for TargetLayout {
    fn default() -> Self {
        Self::with_pointer_size(8)
    }
}

/// Size and alignment of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    pub size: usize,
    pub align: usize,
}

impl Layout {
    pub const fn new(size: usize, align: usize) -> Self {
        Self { size, align }
    }

    /// Layout of a pointer or reference slot.
    pub const fn pointer(target: &TargetLayout) -> Self {
        Self {
            size: target.pointer_size,
            align: target.pointer_size,
        }
    }
}

/// Placement of one field inside a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    pub offset: usize,
    pub layout: Layout,
}

/// Full layout of a blittable type. Enums have no fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub layout: Layout,
    pub fields: Vec<FieldLayout>,
}

impl StructLayout {
    /// Lay out fields in declaration order using C rules.
    ///
    /// Each field is placed at the next offset aligned to its alignment; the
    /// total size is padded to the largest field alignment. An empty struct
    /// has size 0 and alignment 1.
    pub fn c_struct(fields: impl IntoIterator<Item = (String, Layout)>) -> Self {
        let mut offset = 0;
        let mut align = 1;
        let mut placed = Vec::new();

        for (name, layout) in fields {
            offset = align_up(offset, layout.align);
            placed.push(FieldLayout {
                name,
                offset,
                layout,
            });
            offset += layout.size;
            align = align.max(layout.align);
        }

        Self {
            layout: Layout::new(align_up(offset, align), align),
            fields: placed,
        }
    }

    /// Layout of a fieldless type such as an enum.
    pub fn scalar(layout: Layout) -> Self {
        Self {
            layout,
            fields: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.layout.size
    }
}

/// Whether the return slot counts towards a call's parameter-block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReturnSlotPolicy {
    /// Only arguments are counted.
    #[default]
    Excluded,
    /// Arguments plus the return value's size.
    Included,
}

/// Round `offset` up to a multiple of `align`.
pub const fn align_up(offset: usize, align: usize) -> usize {
    if align <= 1 {
        offset
    } else {
        offset.div_ceil(align) * align
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_floats_pack_tightly() {
        let f = Layout::new(4, 4);
        let layout = StructLayout::c_struct(
            ["r", "g", "b", "a"].into_iter().map(|n| (n.to_string(), f)),
        );
        assert_eq!(layout.size(), 16);
        assert_eq!(layout.layout.align, 4);
        let offsets: Vec<_> = layout.fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 4, 8, 12]);
    }

    #[test]
    fn padding_follows_c_rules() {
        let layout = StructLayout::c_struct([
            ("flag".to_string(), Layout::new(1, 1)),
            ("id".to_string(), Layout::new(8, 8)),
            ("tag".to_string(), Layout::new(2, 2)),
        ]);
        assert_eq!(layout.fields[1].offset, 8);
        assert_eq!(layout.fields[2].offset, 16);
        assert_eq!(layout.size(), 24);
    }

    #[test]
    fn empty_struct() {
        let layout = StructLayout::c_struct(Vec::new());
        assert_eq!(layout.layout, Layout::new(0, 1));
    }

    #[test]
    fn align_up_values() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(9, 4), 12);
        assert_eq!(align_up(5, 1), 5);
    }

    #[test]
    fn return_slot_defaults_to_excluded() {
        assert_eq!(ReturnSlotPolicy::default(), ReturnSlotPolicy::Excluded);
    }
}
