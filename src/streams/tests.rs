// Stream module tests.

use super::*;
use crate::models::{BadLink, LinkType, Outlink, PageStatus};
use tempfile::TempDir;

fn bad_link(src: u64, dst: u64, code: u16) -> BadLink {
    BadLink {
        src_url_id: src,
        dst_url_id: dst,
        http_code: code,
    }
}

fn list_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_decode_external_outlink() {
    let link = OutlinksStreamDef::decode_line("5\ta\t0\t-1\thttp://other.com/c").unwrap();
    assert_eq!(
        link,
        Outlink {
            src_url_id: 5,
            link_type: LinkType::Anchor,
            bitmask: 0,
            dst_url_id: None,
            external_url: Some("http://other.com/c".to_string()),
        }
    );
    assert_eq!(
        OutlinksStreamDef::encode_line(&link),
        "5\ta\t0\t-1\thttp://other.com/c"
    );
}

#[test]
fn test_decode_internal_outlink_has_no_external_url() {
    let link = OutlinksStreamDef::decode_line("5\tr301\t4\t12\t").unwrap();
    assert_eq!(link.dst_url_id, Some(12));
    assert_eq!(link.link_type, LinkType::Redirect(301));
    assert_eq!(link.external_url, None);
}

#[test]
fn test_decode_rejects_wrong_field_count() {
    let err = InfosStreamDef::decode_line("1\t200\textra").unwrap_err();
    assert!(err.contains("expected 2 fields"), "{err}");
}

#[test]
fn test_decode_reports_field_name() {
    let err = InfosStreamDef::decode_line("1\tnot-a-code").unwrap_err();
    assert!(err.contains("http_code"), "{err}");
}

#[test]
fn test_descriptor_field_idx() {
    let descriptor = OutlinksStreamDef::DESCRIPTOR;
    assert_eq!(descriptor.field_idx("dst_url_id"), Some(3));
    assert_eq!(descriptor.field_idx("missing"), None);
}

#[test]
fn test_partition_routing() {
    let options = PartitionOptions {
        first_part_size: 10,
        part_size: 5,
        part_id: None,
    };
    assert_eq!(options.part_for(0), 0);
    assert_eq!(options.part_for(9), 0);
    assert_eq!(options.part_for(10), 1);
    assert_eq!(options.part_for(14), 1);
    assert_eq!(options.part_for(15), 2);
    assert_eq!(PartitionOptions::single_part(7).part_for(123), 7);
}

#[test]
fn test_persist_then_load_across_parts() {
    let dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let options = PartitionOptions {
        first_part_size: 10,
        part_size: 10,
        part_id: None,
    };
    let links = vec![bad_link(1, 2, 404), bad_link(12, 3, 500), bad_link(25, 4, 301)];

    let written = persist::<BadLinksStreamDef, _>(links.clone(), dir.path(), &options).unwrap();
    assert_eq!(written.len(), 3);
    assert_eq!(
        list_names(dir.path()),
        vec![
            "urlbadlinks.txt.0.gz",
            "urlbadlinks.txt.1.gz",
            "urlbadlinks.txt.2.gz"
        ]
    );

    let location = dir.path().to_str().unwrap();
    let all: Vec<BadLink> =
        BadLinksStreamDef::load(&LocalStreamSource, location, scratch.path(), None, false)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
    assert_eq!(all, links);

    let part_one: Vec<BadLink> =
        BadLinksStreamDef::load(&LocalStreamSource, location, scratch.path(), Some(1), false)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
    assert_eq!(part_one, vec![bad_link(12, 3, 500)]);
}

#[test]
fn test_persist_empty_stream_writes_first_part() {
    let dir = TempDir::new().unwrap();
    persist::<BadLinksStreamDef, _>(Vec::new(), dir.path(), &PartitionOptions::default()).unwrap();
    assert_eq!(list_names(dir.path()), vec!["urlbadlinks.txt.0.gz"]);
}

#[test]
fn test_uncommitted_parts_are_removed() {
    let dir = TempDir::new().unwrap();
    let pending = write_parts::<BadLinksStreamDef, _>(
        vec![bad_link(1, 2, 404)],
        dir.path(),
        &PartitionOptions::default(),
    )
    .unwrap();
    assert_eq!(pending.records(), 1);
    assert_eq!(list_names(dir.path()).len(), 1);
    drop(pending);
    assert!(list_names(dir.path()).is_empty());
}

#[test]
fn test_failed_commit_rolls_back_renamed_parts() {
    let dir = TempDir::new().unwrap();
    let options = PartitionOptions {
        first_part_size: 10,
        part_size: 10,
        part_id: None,
    };
    let pending = write_parts::<BadLinksStreamDef, _>(
        vec![bad_link(1, 2, 404), bad_link(12, 3, 500)],
        dir.path(),
        &options,
    )
    .unwrap();
    // A non-empty directory at part 0's name makes its rename fail after
    // part 1 was already moved into place.
    let blocker = dir.path().join("urlbadlinks.txt.0.gz");
    std::fs::create_dir(&blocker).unwrap();
    std::fs::write(blocker.join("keep"), b"").unwrap();

    assert!(pending.commit().is_err());
    assert_eq!(list_names(dir.path()), vec!["urlbadlinks.txt.0.gz"]);
    assert!(blocker.is_dir());
}

#[test]
fn test_load_missing_stream_is_an_error() {
    let dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let result = InfosStreamDef::load(
        &LocalStreamSource,
        dir.path().to_str().unwrap(),
        scratch.path(),
        None,
        false,
    );
    assert!(matches!(result, Err(StreamError::MissingPart { .. })));
}

#[test]
fn test_fetch_reuses_scratch_copy_unless_forced() {
    let dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let location = dir.path().to_str().unwrap();
    let statuses = vec![PageStatus {
        url_id: 1,
        http_code: 200,
    }];
    persist::<InfosStreamDef, _>(statuses, dir.path(), &PartitionOptions::default()).unwrap();
    LocalStreamSource
        .fetch(location, "urlinfos", None, scratch.path(), false)
        .unwrap();

    // Replace the source part; a non-forced fetch keeps the stale scratch copy.
    let updated = vec![PageStatus {
        url_id: 1,
        http_code: 404,
    }];
    persist::<InfosStreamDef, _>(updated, dir.path(), &PartitionOptions::default()).unwrap();

    let stale: Vec<PageStatus> =
        InfosStreamDef::load(&LocalStreamSource, location, scratch.path(), None, false)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
    assert_eq!(stale[0].http_code, 200);

    let fresh: Vec<PageStatus> =
        InfosStreamDef::load(&LocalStreamSource, location, scratch.path(), None, true)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
    assert_eq!(fresh[0].http_code, 404);
}

#[test]
fn test_cache_replays_identically() {
    let dir = TempDir::new().unwrap();
    let links = vec![bad_link(1, 2, 404), bad_link(1, 3, 500)];
    let cache = StreamCache::<BadLinksStreamDef>::cache(links.clone(), dir.path()).unwrap();
    assert_eq!(cache.len(), 2);

    let first: Vec<BadLink> = cache.get_stream().unwrap().collect::<Result<_, _>>().unwrap();
    let second: Vec<BadLink> = cache.get_stream().unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(first, links);
    assert_eq!(second, links);
}

#[test]
fn test_cache_file_removed_on_drop() {
    let dir = TempDir::new().unwrap();
    let cache = StreamCache::<BadLinksStreamDef>::cache(vec![bad_link(1, 2, 404)], dir.path())
        .unwrap();
    let path = cache.path().to_path_buf();
    assert!(path.exists());
    drop(cache);
    assert!(!path.exists());
}

#[test]
fn test_process_results_stops_at_first_error() {
    let items: Vec<Result<u32, String>> = vec![Ok(1), Ok(2), Err("boom".into()), Ok(4)];
    let mut seen = Vec::new();
    let result = process_results(items, |iter| {
        for value in iter {
            seen.push(value);
        }
    });
    assert_eq!(result, Err("boom".to_string()));
    assert_eq!(seen, vec![1, 2]);

    let ok: Vec<Result<u32, String>> = vec![Ok(1), Ok(2)];
    assert_eq!(process_results(ok, |iter| iter.sum::<u32>()), Ok(3));
}
