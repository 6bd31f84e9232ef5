//! Reading and patching ROM files on disk.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use nether_hex::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Monster {
    hp: u16,
    attack: u8,
    color: u16,
}

impl Structure for Monster {
    fn layout() -> Layout<Self> {
        Layout::new()
            .field(FieldDescriptor::value("hp", 0, |m: &mut Self| &mut m.hp))
            .field(FieldDescriptor::value("attack", "${monster.attack|2}", |m: &mut Self| {
                &mut m.attack
            }))
            .field(FieldDescriptor::value("color", "0x4", |m: &mut Self| &mut m.color))
    }
}

/// Two monsters in a table at 0x20, 8 bytes apart
fn write_rom() -> tempfile::NamedTempFile {
    let mut rom = vec![0u8; 0x40];
    rom[0x20..0x26].copy_from_slice(&[0x64, 0x00, 0x0A, 0x00, 0x1F, 0x7C]);
    rom[0x28..0x2E].copy_from_slice(&[0xC8, 0x00, 0x14, 0x00, 0xE0, 0x03]);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&rom).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_file_round_trip() {
    let rom = write_rom();
    let ctx = HexContext::default();
    let cursor = Cursor::open(rom.path()).unwrap().fork_at(0x28);

    let mut monster: Monster = ctx.read(&cursor).unwrap();
    assert_eq!(monster, Monster { hp: 200, attack: 20, color: 0x03E0 });

    let red = Bitmask::for_bit_range(0, 4);
    let blue = Bitmask::for_bit_range(10, 14);
    assert_eq!(red.apply(monster.color as u32), 0);
    monster.color = BitmaskMerge::new().with(red, 31).with(blue, 31).result() as u16;
    monster.hp += 1;
    ctx.write(&mut monster, &cursor).unwrap();

    let bytes = std::fs::read(rom.path()).unwrap();
    assert_eq!(&bytes[0x28..0x2E], &[0xC9, 0x00, 0x14, 0x00, 0x1F, 0x7C]);
    // neighbouring entry untouched
    assert_eq!(&bytes[0x20..0x26], &[0x64, 0x00, 0x0A, 0x00, 0x1F, 0x7C]);
}

#[test]
fn test_offsets_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("offsets.toml");
    std::fs::write(&config_path, "[monster]\nattack = \"0x3\"\n").unwrap();

    let ctx = HexContext::with_primitives(TomlConfig::load(&config_path).unwrap());
    let cursor = Cursor::from_bytes(vec![0x01, 0x00, 0xAA, 0x42, 0x00, 0x00]);

    let monster: Monster = ctx.read(&cursor).unwrap();
    assert_eq!(monster.attack, 0x42);
}

#[test]
fn test_table_through_for_each() {
    #[derive(Default)]
    struct Table {
        monsters: Vec<Monster>,
    }

    fn monsters(table: &mut Table) -> Vec<&mut Monster> {
        table.monsters.iter_mut().collect()
    }

    let rom = write_rom();
    let ctx = HexContext::default();
    let mut cursor = Cursor::open(rom.path()).unwrap().fork_at(0x20);
    let pipe = ForEachPipe::new(monsters, StructurePipe::<Monster>::of()).stride(8);

    let mut table = Table {
        monsters: vec![Monster::default(); 2],
    };
    pipe.read(&mut table, &mut cursor, &ctx).unwrap();
    assert_eq!(table.monsters[0].hp, 100);
    assert_eq!(table.monsters[1].hp, 200);
    assert_eq!(cursor.position(), 0x20);
}

#[test]
fn test_stage_patch_then_flush() {
    let rom = write_rom();
    let ctx = HexContext::default();
    let file = Cursor::open(rom.path()).unwrap();

    let mut monster: Monster = ctx.read(&file.fork_at(0x20)).unwrap();
    monster.attack = 99;

    // Stage the write in a sparse window first
    let patch = Rc::new(RefCell::new(ByteWindow::new()));
    let staged = Cursor::new(patch.clone()).fork_at(0x20);
    ctx.write(&mut monster, &staged).unwrap();
    {
        let window = patch.borrow();
        assert_eq!(window.min_offset(), Some(0x20));
        assert_eq!(window.count(), 5);
        assert!(!window.has_no_holes());
        assert_eq!(window.runs().len(), 2);
    }

    file.write_window(0, &patch.borrow()).unwrap();
    let bytes = std::fs::read(rom.path()).unwrap();
    assert_eq!(&bytes[0x20..0x26], &[0x64, 0x00, 99, 0x00, 0x1F, 0x7C]);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Cursor::open(dir.path().join("missing.gba")).unwrap_err();
    assert!(matches!(err, AccessError::Io(_)));
}
