//! Tests for destination backends and the writer lifecycle.

use super::*;
use crate::error::Error;
use chrono::{TimeZone, Utc};
use nexus_schema::{decode, CharacterData};
use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

const TIMEOUT: Duration = Duration::from_secs(1);

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("nexus.db")
}

fn sample_character(slot: u8) -> Character {
    let created_at = Utc.with_ymd_and_hms(2022, 9, 1, 18, 30, 0).unwrap();
    Character {
        id: Uuid::new_v4(),
        steam_id: "76561198000000001".to_string(),
        slot,
        created_at,
        data: CharacterData {
            created_at,
            size: 2048,
            data: "payload".to_string(),
        },
    }
}

fn check_put_get_and_namespaces<B: Backend>() {
    let dir = TempDir::new().unwrap();
    let store = B::open(&store_path(&dir), TIMEOUT).unwrap();

    store.put(Namespace::Users, "shared", b"user").unwrap();
    store.put(Namespace::Characters, "shared", b"char").unwrap();

    assert_eq!(
        store.get(Namespace::Users, "shared").unwrap().as_deref(),
        Some(&b"user"[..])
    );
    assert_eq!(
        store.get(Namespace::Characters, "shared").unwrap().as_deref(),
        Some(&b"char"[..])
    );
    assert_eq!(store.get(Namespace::Users, "missing").unwrap(), None);
    assert_eq!(store.count(Namespace::Users).unwrap(), 1);
    assert_eq!(store.count(Namespace::Characters).unwrap(), 1);
    store.close().unwrap();
}

fn check_overwrite<B: Backend>() {
    let dir = TempDir::new().unwrap();
    let store = B::open(&store_path(&dir), TIMEOUT).unwrap();

    store.put(Namespace::Users, "76561198000000001", b"first").unwrap();
    store.put(Namespace::Users, "76561198000000001", b"second").unwrap();

    assert_eq!(
        store.get(Namespace::Users, "76561198000000001").unwrap().as_deref(),
        Some(&b"second"[..])
    );
    assert_eq!(store.count(Namespace::Users).unwrap(), 1);
    store.close().unwrap();
}

fn check_survives_reopen<B: Backend>() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let store = B::open(&path, TIMEOUT).unwrap();
    store.put(Namespace::Characters, "abc", b"kept").unwrap();
    store.close().unwrap();

    let store = B::open(&path, TIMEOUT).unwrap();
    assert_eq!(
        store.get(Namespace::Characters, "abc").unwrap().as_deref(),
        Some(&b"kept"[..])
    );
    assert_eq!(store.count(Namespace::Users).unwrap(), 0);
    store.close().unwrap();
}

async fn check_writer_lifecycle<B: Backend>() {
    let dir = TempDir::new().unwrap();
    let mut writer = Migrator::<B>::new(MigrationOptions::default());
    let user = User::new("76561198000000001");

    assert_eq!(writer.state(), "unopened");
    assert!(matches!(
        writer.insert_user(&user).await,
        Err(Error::NotInitialized("unopened"))
    ));

    writer.open(&store_path(&dir)).await.unwrap();
    assert_eq!(writer.state(), "open");
    writer.insert_user(&user).await.unwrap();
    assert!(matches!(
        writer.open(&store_path(&dir)).await,
        Err(Error::DestOpenFailed(_))
    ));

    writer.close().await.unwrap();
    assert_eq!(writer.state(), "closed");
    assert!(matches!(
        writer.insert_char(&sample_character(1)).await,
        Err(Error::NotInitialized("closed"))
    ));
}

async fn check_insert_user_last_write_wins<B: Backend>() {
    let dir = TempDir::new().unwrap();
    let mut writer = Migrator::<B>::new(MigrationOptions::default());
    writer.open(&store_path(&dir)).await.unwrap();

    let mut first = User::new("76561198000000001");
    first.characters.insert(1, Uuid::new_v4());
    first.characters.insert(2, Uuid::new_v4());
    let mut second = User::new("76561198000000001");
    let replacement = Uuid::new_v4();
    second.characters.insert(3, replacement);

    writer.insert_user(&first).await.unwrap();
    writer.insert_user(&second).await.unwrap();

    let bytes = writer
        .store()
        .unwrap()
        .get(Namespace::Users, "76561198000000001")
        .unwrap()
        .unwrap();
    let stored: User = decode(&bytes).unwrap();
    assert_eq!(stored.characters.len(), 1);
    assert_eq!(stored.characters[&3], replacement);
    writer.close().await.unwrap();
}

async fn check_insert_char_keyed_by_uuid<B: Backend>() {
    let dir = TempDir::new().unwrap();
    let mut writer = Migrator::<B>::new(MigrationOptions::default());
    writer.open(&store_path(&dir)).await.unwrap();
    let character = sample_character(2);

    writer.insert_char(&character).await.unwrap();

    let bytes = writer
        .store()
        .unwrap()
        .get(Namespace::Characters, &character.id.to_string())
        .unwrap()
        .unwrap();
    let stored: Character = decode(&bytes).unwrap();
    assert_eq!(stored, character);
    writer.close().await.unwrap();
}

macro_rules! backend_tests {
    ($module:ident, $backend:ty) => {
        mod $module {
            use super::*;

            #[test]
            fn test_put_get_and_namespaces() {
                check_put_get_and_namespaces::<$backend>();
            }

            #[test]
            fn test_overwrite() {
                check_overwrite::<$backend>();
            }

            #[test]
            fn test_survives_reopen() {
                check_survives_reopen::<$backend>();
            }

            #[tokio::test]
            async fn test_writer_lifecycle() {
                check_writer_lifecycle::<$backend>().await;
            }

            #[tokio::test]
            async fn test_insert_user_last_write_wins() {
                check_insert_user_last_write_wins::<$backend>().await;
            }

            #[tokio::test]
            async fn test_insert_char_keyed_by_uuid() {
                check_insert_char_keyed_by_uuid::<$backend>().await;
            }
        }
    };
}

backend_tests!(bolt_store, BoltStore);
backend_tests!(badger_store, BadgerStore);

#[test]
fn test_create_migrator_selects_backend() {
    let options = MigrationOptions::default();
    assert_eq!(
        create_migrator(DestinationKind::Bbolt, options.clone()).kind(),
        DestinationKind::Bbolt
    );
    assert_eq!(
        create_migrator(DestinationKind::Badger, options).kind(),
        DestinationKind::Badger
    );
}

#[tokio::test]
async fn test_locked_open_does_not_stall_runtime() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let holder = BoltStore::open(&path, TIMEOUT).unwrap();
    let mut writer = Migrator::<BoltStore>::new(MigrationOptions {
        open_timeout_secs: 5,
        ..MigrationOptions::default()
    });

    // The holder can only let go if the runtime thread is free while the
    // writer waits for the lock.
    let release = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        holder.close().unwrap();
    };
    let (opened, ()) = tokio::join!(writer.open(&path), release);

    opened.unwrap();
    assert_eq!(writer.state(), "open");
    writer.close().await.unwrap();
}

#[test]
fn test_open_with_lock_timeout_gives_up() {
    let mut attempts = 0;
    let result: std::result::Result<(), &str> = open_with_lock_timeout(
        Duration::from_millis(250),
        || {
            attempts += 1;
            Err("locked")
        },
        |_| true,
    );

    assert!(result.is_err());
    assert!(attempts >= 2);
}

#[test]
fn test_open_with_lock_timeout_does_not_retry_other_errors() {
    let mut attempts = 0;
    let result: std::result::Result<(), &str> = open_with_lock_timeout(
        Duration::from_secs(5),
        || {
            attempts += 1;
            Err("permission denied")
        },
        |e| *e == "locked",
    );

    assert!(result.is_err());
    assert_eq!(attempts, 1);
}
