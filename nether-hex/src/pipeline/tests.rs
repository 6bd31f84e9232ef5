//! Tests for pipeline composition

use super::*;
use crate::config::MapConfig;
use crate::error::AccessError;
use crate::layout::{FieldDescriptor, Layout, Structure};

/// Appends a marker to the target instead of touching bytes
struct Mark(&'static str);

#[derive(Default)]
struct Trace {
    steps: Vec<String>,
}

impl ReadPipe<Trace> for Mark {
    fn read(&self, target: &mut Trace, _: &mut Cursor, _: &HexContext) -> Result<()> {
        target.steps.push(format!("read {}", self.0));
        Ok(())
    }
}

impl WritePipe<Trace> for Mark {
    fn write(&self, _: &mut Cursor, target: &mut Trace, _: &HexContext) -> Result<()> {
        target.steps.push(format!("write {}", self.0));
        Ok(())
    }
}

/// Reads one byte and moves the cursor past it
struct TakeByte;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Item(u8);

impl ReadPipe<Item> for TakeByte {
    fn read(&self, target: &mut Item, cursor: &mut Cursor, _: &HexContext) -> Result<()> {
        target.0 = cursor.get_byte(0)?;
        cursor.advance_relative(1)?;
        Ok(())
    }
}

impl WritePipe<Item> for TakeByte {
    fn write(&self, cursor: &mut Cursor, target: &mut Item, _: &HexContext) -> Result<()> {
        cursor.write(0, &[target.0])?;
        cursor.advance_relative(1)?;
        Ok(())
    }
}

#[derive(Default)]
struct Table {
    items: Vec<Item>,
}

fn table_items(table: &mut Table) -> Vec<&mut Item> {
    table.items.iter_mut().collect()
}

#[test]
fn test_linear_read_and_write_orders_are_independent() {
    let ctx = HexContext::default();
    let mut cursor = Cursor::from_bytes(vec![0; 4]);
    let pipe = LinearPipe::<Trace>::new()
        .then(Mark("both"))
        .then_read(Mark("a"))
        .then_read(Mark("b"))
        .then_write(Mark("b"))
        .then_write(Mark("a"));
    assert_eq!((pipe.read_len(), pipe.write_len()), (3, 3));

    let mut trace = Trace::default();
    pipe.read(&mut trace, &mut cursor, &ctx).unwrap();
    pipe.write(&mut cursor, &mut trace, &ctx).unwrap();
    assert_eq!(
        trace.steps,
        ["read both", "read a", "read b", "write both", "write b", "write a"]
    );
}

#[test]
fn test_for_each_children_start_from_parent_position() {
    let ctx = HexContext::default();
    let mut cursor = Cursor::from_bytes(vec![0xAA, 0xBB, 0xCC]);
    let pipe = ForEachPipe::new(table_items, TakeByte);

    let mut table = Table {
        items: vec![Item::default(); 3],
    };
    pipe.read(&mut table, &mut cursor, &ctx).unwrap();

    // TakeByte advances its own fork only
    assert_eq!(table.items, [Item(0xAA); 3]);
    assert_eq!(cursor.position(), 0);
}

#[test]
fn test_for_each_with_stride() {
    let ctx = HexContext::default();
    let mut cursor = Cursor::from_bytes(vec![0x00, 0x11, 0x22, 0x33, 0x44]).fork_at(1);
    let pipe = ForEachPipe::new(table_items, TakeByte).stride(2);

    let mut table = Table {
        items: vec![Item::default(); 2],
    };
    pipe.read(&mut table, &mut cursor, &ctx).unwrap();
    assert_eq!(table.items, [Item(0x11), Item(0x33)]);

    table.items = vec![Item(0xE1), Item(0xE2)];
    pipe.write(&mut cursor, &mut table, &ctx).unwrap();
    assert_eq!(cursor.read(-1, 5).unwrap(), vec![0x00, 0xE1, 0x22, 0xE2, 0x44]);
}

#[test]
fn test_for_each_stops_at_first_failure() {
    let ctx = HexContext::default();
    let mut cursor = Cursor::from_bytes(vec![0x01, 0x02]);
    let pipe = ForEachPipe::new(table_items, TakeByte).stride(1);

    let mut table = Table {
        items: vec![Item::default(); 4],
    };
    let err = pipe.read(&mut table, &mut cursor, &ctx).unwrap_err();
    assert!(matches!(err, HexError::Access(_)));
    assert_eq!(table.items[..2], [Item(0x01), Item(0x02)]);
}

#[derive(Debug, Default, PartialEq)]
struct Variant {
    kind: u8,
    small: u8,
    large: u16,
}

fn variant_pipe() -> LinearPipe<Variant> {
    LinearPipe::new()
        .then(FieldStep::new(FieldDescriptor::value("kind", 0, |v: &mut Variant| {
            &mut v.kind
        })))
        .then(
            SwitchPipe::new()
                .case(
                    |v: &Variant| v.kind == 1,
                    FieldStep::new(FieldDescriptor::value("small", 1, |v: &mut Variant| {
                        &mut v.small
                    })),
                )
                .case(
                    |v: &Variant| v.kind == 2,
                    FieldStep::new(FieldDescriptor::value("large", 1, |v: &mut Variant| {
                        &mut v.large
                    })),
                ),
        )
}

#[test]
fn test_switch_selects_by_decoded_field() {
    let ctx = HexContext::default();
    let pipe = variant_pipe();

    let mut small = Variant::default();
    pipe.read(&mut small, &mut Cursor::from_bytes(vec![1, 0x7F, 0x01]), &ctx)
        .unwrap();
    assert_eq!(small, Variant { kind: 1, small: 0x7F, large: 0 });

    let mut large = Variant::default();
    pipe.read(&mut large, &mut Cursor::from_bytes(vec![2, 0x7F, 0x01]), &ctx)
        .unwrap();
    assert_eq!(large, Variant { kind: 2, small: 0, large: 0x017F });
}

#[test]
fn test_switch_without_match_is_noop() {
    let ctx = HexContext::default();
    let pipe = variant_pipe();
    let mut cursor = Cursor::from_bytes(vec![9, 0xAA, 0xBB]);

    let mut value = Variant::default();
    pipe.read(&mut value, &mut cursor, &ctx).unwrap();
    assert_eq!(value, Variant { kind: 9, small: 0, large: 0 });

    value.small = 0x55;
    pipe.write(&mut cursor, &mut value, &ctx).unwrap();
    assert_eq!(cursor.read(0, 3).unwrap(), vec![9, 0xAA, 0xBB]);
}

#[derive(Debug, Default, PartialEq)]
struct Sprite {
    x: u8,
    y: u8,
    tile: u16,
    checksum: u8,
    decoded: bool,
}

impl Structure for Sprite {
    fn layout() -> Layout<Self> {
        Layout::new()
            .field(FieldDescriptor::value("x", 0, |s: &mut Self| &mut s.x))
            .field(FieldDescriptor::value("y", 1, |s: &mut Self| &mut s.y))
            .field(FieldDescriptor::value("tile", "0x2", |s: &mut Self| &mut s.tile))
            .field(FieldDescriptor::value("checksum", 4, |s: &mut Self| {
                &mut s.checksum
            }))
            .post_decode(|s: &mut Self, _, _| {
                s.decoded = true;
                Ok(())
            })
            .pre_encode(|s: &mut Self, _, _| {
                s.checksum = s.x ^ s.y;
                Ok(())
            })
    }
}

#[test]
fn test_structure_hooks_wrap_fields() {
    let ctx = HexContext::default();
    let pipe = StructurePipe::<Sprite>::of();
    assert_eq!(pipe.fields().count(), 4);
    assert_eq!(pipe.size_of(), None);

    let mut cursor = Cursor::from_bytes(vec![0x10, 0x20, 0x05, 0x00, 0x00]);
    let mut sprite = Sprite::default();
    pipe.read(&mut sprite, &mut cursor, &ctx).unwrap();
    assert_eq!(sprite.tile, 5);
    assert!(sprite.decoded);

    // pre_encode runs before the checksum field is written
    sprite.x = 0x0F;
    pipe.write(&mut cursor, &mut sprite, &ctx).unwrap();
    assert_eq!(cursor.read(0, 5).unwrap(), vec![0x0F, 0x20, 0x05, 0x00, 0x2F]);
}

#[test]
fn test_hook_error_aborts() {
    let layout = Layout::new()
        .field(FieldDescriptor::value("x", 0, |s: &mut Sprite| &mut s.x))
        .post_decode(|_: &mut Sprite, _, _| anyhow::bail!("bad sprite"));
    let pipe = StructurePipe::new(layout);

    let err = pipe
        .read(&mut Sprite::default(), &mut Cursor::from_bytes(vec![1]), &HexContext::default())
        .unwrap_err();
    assert!(matches!(err, HexError::Hook(_)));
    assert!(err.to_string().contains("bad sprite"));
}

#[derive(Debug, Default, PartialEq)]
struct Frame {
    id: u8,
    sprite: Sprite,
}

impl Structure for Frame {
    fn layout() -> Layout<Self> {
        Layout::new()
            .field(FieldDescriptor::value("id", 0, |f: &mut Self| &mut f.id))
            .field(FieldDescriptor::value("sprite", 1, |f: &mut Self| &mut f.sprite))
    }
}

#[test]
fn test_nested_structure_requires_registration() {
    let bytes = vec![0x03, 0x01, 0x02, 0x34, 0x12, 0x03];

    let ctx = HexContext::default();
    let err = ctx.read::<Frame>(&Cursor::from_bytes(bytes.clone())).unwrap_err();
    assert!(matches!(err, HexError::Field { ref field, address: 1, .. } if field == "sprite"));
    assert!(matches!(err.root(), HexError::NoCodec { .. }));
    assert!(err.is_setup_defect());

    let mut ctx = HexContext::default();
    ctx.register_structure::<Sprite>();
    let frame: Frame = ctx.read(&Cursor::from_bytes(bytes)).unwrap();
    assert_eq!(frame.id, 3);
    assert_eq!(
        frame.sprite,
        Sprite { x: 1, y: 2, tile: 0x1234, checksum: 3, decoded: true }
    );
}

#[test]
fn test_unresolvable_offset() {
    let ctx = HexContext::default();
    let step = FieldStep::new(FieldDescriptor::value("x", "${missing}", |s: &mut Sprite| {
        &mut s.x
    }));

    let err = step
        .read(&mut Sprite::default(), &mut Cursor::from_bytes(vec![0; 2]), &ctx)
        .unwrap_err();
    assert!(matches!(err.root(), HexError::BadOffset { expr, .. } if expr == "${missing}"));
    assert!(!err.is_setup_defect());
}

#[test]
fn test_field_address() {
    let ctx = HexContext::with_primitives(MapConfig::new().with("table", "0x10"));
    let cursor = Cursor::from_bytes(vec![0; 0x20]).fork_at(4);

    let relative = FieldStep::new(FieldDescriptor::value("r", "${table}", |s: &mut Sprite| {
        &mut s.x
    }));
    let absolute = FieldStep::new(
        FieldDescriptor::value("a", "${table}", |s: &mut Sprite| &mut s.x).absolute(),
    );
    let behind = FieldStep::new(FieldDescriptor::value("b", "-8", |s: &mut Sprite| &mut s.x));

    assert_eq!(relative.address(&cursor, &ctx).unwrap(), 0x14);
    assert_eq!(absolute.address(&cursor, &ctx).unwrap(), 0x10);
    assert!(matches!(
        behind.address(&cursor, &ctx),
        Err(HexError::Access(AccessError::NegativeOffset { .. }))
    ));
}

#[test]
fn test_write_failure_keeps_earlier_bytes() {
    let ctx = HexContext::default();
    let pipe = StructurePipe::<Sprite>::of();
    let mut cursor = Cursor::from_bytes(vec![0; 3]);

    let mut sprite = Sprite { x: 1, y: 2, ..Sprite::default() };
    assert!(pipe.write(&mut cursor, &mut sprite, &ctx).is_err());
    assert_eq!(cursor.read(0, 2).unwrap(), vec![1, 2]);
}
