use emojimix_core::db::open_db_in_memory;
use emojimix_core::{EmojiMix, MixRepository, MixRow, RepoError, Rgba, SqliteMixRepository};
use uuid::Uuid;

#[test]
fn insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMixRepository::new(&conn);

    let mix = EmojiMix::new("😀😁", Rgba::opaque(0x12, 0x34, 0x56));
    let row = MixRow::from_mix(&mix);
    let id = repo.insert_row(&row).unwrap();

    let loaded = repo.get_row(id).unwrap().unwrap();
    assert_eq!(loaded, row);
    assert_eq!(loaded.decode().unwrap().mix, mix);
}

#[test]
fn nullable_fields_survive_storage() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMixRepository::new(&conn);

    let row = MixRow {
        id: Uuid::new_v4(),
        emojis: Some("😀".to_string()),
        color_hex: None,
    };
    repo.insert_row(&row).unwrap();

    let loaded = repo.get_row(row.id).unwrap().unwrap();
    assert_eq!(loaded.emojis.as_deref(), Some("😀"));
    assert_eq!(loaded.color_hex, None);
}

#[test]
fn update_row_changes_fields_in_place() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMixRepository::new(&conn);

    let original = EmojiMix::new("😀", Rgba::opaque(255, 0, 0));
    let row = MixRow::from_mix(&original);
    repo.insert_row(&row).unwrap();

    let replacement = EmojiMix::new("🥝🥝", Rgba::opaque(0, 255, 0));
    repo.update_row(&MixRow::with_id(row.id, &replacement)).unwrap();

    let loaded = repo.get_row(row.id).unwrap().unwrap();
    assert_eq!(loaded.decode().unwrap().mix, replacement);
}

#[test]
fn update_row_not_found_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMixRepository::new(&conn);

    let row = MixRow::from_mix(&EmojiMix::new("😀", Rgba::opaque(1, 2, 3)));
    let err = repo.update_row(&row).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == row.id));
}

#[test]
fn delete_row_removes_the_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMixRepository::new(&conn);

    let row = MixRow::from_mix(&EmojiMix::new("😀", Rgba::opaque(1, 2, 3)));
    repo.insert_row(&row).unwrap();

    repo.delete_row(row.id).unwrap();
    assert!(repo.get_row(row.id).unwrap().is_none());

    let err = repo.delete_row(row.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == row.id));
}

#[test]
fn list_rows_orders_by_emojis_code_points() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMixRepository::new(&conn);

    // "😁" (U+1F601) sorts after "😀😀" (starting U+1F600) byte-wise.
    let grin = MixRow::from_mix(&EmojiMix::new("😁", Rgba::opaque(0, 0, 255)));
    let double_smile = MixRow::from_mix(&EmojiMix::new("😀😀", Rgba::opaque(255, 0, 0)));
    repo.insert_row(&grin).unwrap();
    repo.insert_row(&double_smile).unwrap();

    let rows = repo.list_rows().unwrap();
    let emojis: Vec<_> = rows.iter().map(|row| row.emojis.as_deref()).collect();
    assert_eq!(emojis, [Some("😀😀"), Some("😁")]);
}

#[test]
fn list_rows_breaks_emoji_ties_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMixRepository::new(&conn);

    let mix = EmojiMix::new("😀", Rgba::opaque(9, 9, 9));
    let low = MixRow::with_id(
        Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap(),
        &mix,
    );
    let high = MixRow::with_id(
        Uuid::parse_str("00000000-0000-4000-8000-000000000002").unwrap(),
        &mix,
    );
    repo.insert_row(&high).unwrap();
    repo.insert_row(&low).unwrap();

    let ids: Vec<_> = repo.list_rows().unwrap().iter().map(|row| row.id).collect();
    assert_eq!(ids, [low.id, high.id]);
}
