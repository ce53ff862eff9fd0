use crate::apply::{check_rename_target, rename_in_place, set_file_times, target_taken};
use crate::config::Config;
use crate::metadata::CaptureProbe;
use crate::names::leading_token;
use crate::planner::{plan_rename, timestamp_from_token, ItemFailure, RenameAction};
use crate::report::BatchReport;
use crate::scan::{list_work_items, WorkItem};
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DUMMY_RUN_PREFIX: &str = "DUMMY_RUN: ";

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// ファイル名を正規形式へリネームする
    pub rename: bool,
    /// 正規名のファイルのアクセス/更新時刻をファイル名から復元する
    pub fix_timestamps: bool,
    pub dry_run: bool,
    pub config: Config,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            rename: true,
            fix_timestamps: false,
            dry_run: false,
            config: Config::default(),
        }
    }
}

/// フォルダを列挙して一括処理し、失敗があれば最後にまとめて出力する。
pub fn run_directory(
    dir: &Path,
    options: &RunOptions,
    probe: &dyn CaptureProbe,
) -> Result<BatchReport> {
    let mut items = list_work_items(dir, &options.config.all_extensions())?;
    info!("{} 件のファイルを処理します: {}", items.len(), dir.display());
    let report = run_batch(&mut items, options, probe);
    report.emit();
    Ok(report)
}

/// 1件の失敗で残りを止めることはない。
pub fn run_batch(
    items: &mut [WorkItem],
    options: &RunOptions,
    probe: &dyn CaptureProbe,
) -> BatchReport {
    let total = items.len();
    let mut report = BatchReport::new(total, options.dry_run);
    let mut claimed = HashSet::<PathBuf>::new();
    let dummy = if options.dry_run { DUMMY_RUN_PREFIX } else { "" };

    for (index, item) in items.iter_mut().enumerate() {
        let prefix = format!("{dummy}{}/{total}", index + 1);
        process_item(item, &prefix, options, probe, &mut claimed, &mut report);
    }

    report
}

fn process_item(
    item: &mut WorkItem,
    prefix: &str,
    options: &RunOptions,
    probe: &dyn CaptureProbe,
    claimed: &mut HashSet<PathBuf>,
    report: &mut BatchReport,
) {
    let name = item.name();

    // リネームしない場合は撮影日時を読まずに正規名かどうかだけ見る
    let planned = if options.rename {
        plan_rename(item, &options.config, probe)
    } else {
        match leading_token(&item.unmarked_name) {
            Some(token) => Ok(RenameAction::AlreadyCanonical {
                token: token.to_string(),
            }),
            None => {
                log_repair_skip(&name, prefix, options);
                info!("{prefix} {name} - リネーム無効のためスキップします");
                item.status = "skipped".to_string();
                report.skipped += 1;
                return;
            }
        }
    };

    let action = match planned {
        Ok(action) => action,
        Err(failure) => {
            log_repair_skip(&name, prefix, options);
            record_failure(item, &name, prefix, failure, report);
            return;
        }
    };

    let new_name = match action {
        RenameAction::AlreadyCanonical { token } => {
            if options.fix_timestamps {
                fix_timestamps(item, &name, &token, prefix, options, report);
            } else {
                info!("{prefix} {name} - 正しい名前のためスキップします");
                item.status = "skipped".to_string();
                report.skipped += 1;
            }
            return;
        }
        RenameAction::StripPrefix { new_name } | RenameAction::Derive { new_name, .. } => {
            new_name
        }
    };

    log_repair_skip(&name, prefix, options);
    info!("{prefix} {name} - {new_name} にリネームします");
    let target = item.path.with_file_name(&new_name);
    let outcome = if claimed.contains(&target) {
        Err(target_taken(target))
    } else if options.dry_run {
        check_rename_target(&item.path, &new_name)
    } else {
        rename_in_place(&item.path, &new_name)
    };
    match outcome {
        Ok(new_path) => {
            debug!("{} -> {}", item.path.display(), new_path.display());
            claimed.insert(new_path.clone());
            if !options.dry_run {
                item.path = new_path;
            }
            item.status = format!("renamed to {new_name}");
            report.renamed += 1;
        }
        Err(err) => record_failure(item, &name, prefix, err.into(), report),
    }
}

fn log_repair_skip(name: &str, prefix: &str, options: &RunOptions) {
    if options.fix_timestamps {
        info!("{prefix} {name} - 名前が正規形式でないためタイムスタンプ修正をスキップします");
    }
}

fn fix_timestamps(
    item: &mut WorkItem,
    name: &str,
    token: &str,
    prefix: &str,
    options: &RunOptions,
    report: &mut BatchReport,
) {
    let captured = match timestamp_from_token(token) {
        Ok(captured) => captured,
        Err(failure) => {
            record_failure(item, name, prefix, failure, report);
            return;
        }
    };

    info!("{prefix} {name} - ファイル名からタイムスタンプを設定します");
    debug!("{} の時刻を {} に変更", item.path.display(), captured.date);
    if !options.dry_run {
        if let Err(err) = set_file_times(&item.path, &captured.date) {
            record_failure(item, name, prefix, err.into(), report);
            return;
        }
    }
    item.status = "timestamps fixed".to_string();
    report.timestamps_fixed += 1;
}

fn record_failure(
    item: &mut WorkItem,
    name: &str,
    prefix: &str,
    failure: ItemFailure,
    report: &mut BatchReport,
) {
    warn!("{prefix} {name} - 失敗しました: {}", failure.reason);
    item.status = "failed".to_string();
    report.record_failure(name, failure.kind, failure.reason);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif_reader::tests::jpeg_with_capture_date;
    use crate::metadata::FsProbe;
    use crate::planner::tests::{local_seconds, FakeProbe};
    use crate::report::FailureKind;
    use std::fs;
    use std::time::UNIX_EPOCH;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").expect("create file");
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn scenario_probe() -> FakeProbe {
        FakeProbe::default()
            .with_exif("photo.jpg", "2023:06:15 10:16:00")
            .with_ctime("clip.mp4", local_seconds(2023, 6, 15, 10, 17, 0))
    }

    fn scenario_dir() -> tempfile::TempDir {
        let temp = tempdir().expect("tempdir");
        touch(temp.path(), "IMG_20230615_101500.jpg");
        touch(temp.path(), "photo.jpg");
        touch(temp.path(), "clip.mp4");
        temp
    }

    #[test]
    fn canonicalizes_mixed_directory() {
        let temp = scenario_dir();

        let report = run_directory(temp.path(), &RunOptions::default(), &scenario_probe())
            .expect("run");

        assert_eq!(
            listing(temp.path()),
            vec![
                "20230615_101500.jpg",
                "20230615_101600-photo.jpg",
                "20230615_101700-clip.mp4",
            ]
        );
        assert_eq!(report.renamed, 3);
        assert!(!report.has_failures());
    }

    #[test]
    fn second_run_changes_nothing() {
        let temp = scenario_dir();
        let probe = scenario_probe();
        run_directory(temp.path(), &RunOptions::default(), &probe).expect("first run");
        let after_first = listing(temp.path());

        let report = run_directory(temp.path(), &RunOptions::default(), &probe).expect("second");
        assert_eq!(listing(temp.path()), after_first);
        assert_eq!(report.renamed, 0);
        assert_eq!(report.skipped, 3);
    }

    #[test]
    fn dry_run_decides_but_does_not_rename() {
        let temp = scenario_dir();
        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };

        let report = run_directory(temp.path(), &options, &scenario_probe()).expect("run");
        assert_eq!(
            listing(temp.path()),
            vec!["IMG_20230615_101500.jpg", "clip.mp4", "photo.jpg"]
        );
        assert!(report.dry_run);
        assert_eq!(report.renamed, 3);
    }

    #[test]
    fn file_without_metadata_is_reported_in_both_modes() {
        for dry_run in [true, false] {
            let temp = tempdir().expect("tempdir");
            touch(temp.path(), "holiday.jpg");
            touch(temp.path(), "20220101_120000.jpg");
            let options = RunOptions {
                dry_run,
                ..RunOptions::default()
            };

            let report =
                run_directory(temp.path(), &options, &FakeProbe::default()).expect("run");
            assert_eq!(report.failed_names(), vec!["holiday.jpg"]);
            assert_eq!(report.failures[0].kind, FailureKind::NoCaptureDate);
            assert_eq!(
                listing(temp.path()),
                vec!["20220101_120000.jpg", "holiday.jpg"]
            );
        }
    }

    #[test]
    fn failure_does_not_stop_later_items() {
        let temp = tempdir().expect("tempdir");
        touch(temp.path(), "a.jpg");
        touch(temp.path(), "b.jpg");
        let probe = FakeProbe::default().with_exif("b.jpg", "2022:01:01 12:00:00");

        let report = run_directory(temp.path(), &RunOptions::default(), &probe).expect("run");
        assert_eq!(report.failed_names(), vec!["a.jpg"]);
        assert_eq!(listing(temp.path()), vec!["20220101_120000-b.jpg", "a.jpg"]);
    }

    #[test]
    fn rename_collision_becomes_failure_record() {
        let temp = tempdir().expect("tempdir");
        touch(temp.path(), "IMG_20230615_101500.jpg");
        fs::write(temp.path().join("20230615_101500.jpg"), b"keep").expect("create");
        let mut items = vec![WorkItem::new(temp.path().join("IMG_20230615_101500.jpg"))];

        let report = run_batch(&mut items, &RunOptions::default(), &FakeProbe::default());
        assert_eq!(report.failed_names(), vec!["IMG_20230615_101500.jpg"]);
        assert_eq!(
            report.failures[0].kind,
            FailureKind::FilesystemOperationFailed
        );
        assert_eq!(items[0].status, "failed");
        assert_eq!(
            fs::read(temp.path().join("20230615_101500.jpg")).expect("read"),
            b"keep"
        );
    }

    #[test]
    fn dry_run_sees_targets_claimed_earlier_in_the_batch() {
        for dry_run in [true, false] {
            let temp = tempdir().expect("tempdir");
            touch(temp.path(), "IMG-20230615_101500.jpg");
            touch(temp.path(), "IMG_20230615_101500.jpg");
            let options = RunOptions {
                dry_run,
                ..RunOptions::default()
            };

            let report =
                run_directory(temp.path(), &options, &FakeProbe::default()).expect("run");
            assert_eq!(report.renamed, 1, "dry_run={dry_run}");
            assert_eq!(report.failed_names(), vec!["IMG_20230615_101500.jpg"]);
            assert_eq!(
                report.failures[0].kind,
                FailureKind::FilesystemOperationFailed
            );
        }
    }

    #[test]
    fn capture_year_before_1000_is_never_renamed() {
        let temp = tempdir().expect("tempdir");
        touch(temp.path(), "photo.jpg");
        let probe = FakeProbe::default().with_exif("photo.jpg", "0999:01:01 00:00:00");

        for _ in 0..2 {
            let report =
                run_directory(temp.path(), &RunOptions::default(), &probe).expect("run");
            assert_eq!(report.renamed, 0);
            assert_eq!(report.failed_names(), vec!["photo.jpg"]);
            assert_eq!(report.failures[0].kind, FailureKind::MalformedInput);
            assert_eq!(listing(temp.path()), vec!["photo.jpg"]);
        }
    }

    #[test]
    fn nothing_enabled_skips_every_file() {
        let temp = tempdir().expect("tempdir");
        touch(temp.path(), "IMG_20230615_101500.jpg");
        touch(temp.path(), "20220101_120000.jpg");
        let options = RunOptions {
            rename: false,
            fix_timestamps: false,
            ..RunOptions::default()
        };

        let report = run_directory(temp.path(), &options, &FakeProbe::default()).expect("run");
        assert_eq!(report.skipped, 2);
        assert_eq!(report.renamed, 0);
        assert!(!report.has_failures());
        assert_eq!(
            listing(temp.path()),
            vec!["20220101_120000.jpg", "IMG_20230615_101500.jpg"]
        );
    }

    #[test]
    fn fix_timestamps_sets_times_from_name_and_skips_others() {
        let temp = tempdir().expect("tempdir");
        touch(temp.path(), "a_20220101_120000.jpg");
        touch(temp.path(), "photo.jpg");
        let options = RunOptions {
            rename: false,
            fix_timestamps: true,
            ..RunOptions::default()
        };

        let report = run_directory(temp.path(), &options, &FakeProbe::default()).expect("run");
        assert_eq!(report.timestamps_fixed, 1);
        assert_eq!(report.skipped, 1);
        assert!(!report.has_failures());

        let modified = fs::metadata(temp.path().join("a_20220101_120000.jpg"))
            .expect("metadata")
            .modified()
            .expect("modified");
        let seconds = modified.duration_since(UNIX_EPOCH).expect("epoch").as_secs() as i64;
        assert_eq!(seconds, local_seconds(2022, 1, 1, 12, 0, 0));
        assert_eq!(listing(temp.path()), vec!["a_20220101_120000.jpg", "photo.jpg"]);
    }

    #[test]
    fn fix_timestamps_dry_run_leaves_times_alone() {
        let temp = tempdir().expect("tempdir");
        touch(temp.path(), "20000101_000000.jpg");
        let before = fs::metadata(temp.path().join("20000101_000000.jpg"))
            .expect("metadata")
            .modified()
            .expect("modified");
        let options = RunOptions {
            fix_timestamps: true,
            dry_run: true,
            ..RunOptions::default()
        };

        let report = run_directory(temp.path(), &options, &FakeProbe::default()).expect("run");
        assert_eq!(report.timestamps_fixed, 1);
        let after = fs::metadata(temp.path().join("20000101_000000.jpg"))
            .expect("metadata")
            .modified()
            .expect("modified");
        assert_eq!(before, after);
    }

    #[test]
    fn invalid_token_date_is_malformed_failure() {
        let temp = tempdir().expect("tempdir");
        touch(temp.path(), "20221399_000000.jpg");
        let options = RunOptions {
            fix_timestamps: true,
            ..RunOptions::default()
        };

        let report = run_directory(temp.path(), &options, &FakeProbe::default()).expect("run");
        assert_eq!(report.failures[0].kind, FailureKind::MalformedInput);
    }

    #[test]
    fn real_exif_jpeg_is_renamed_with_fs_probe() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join("photo.jpg"),
            jpeg_with_capture_date("2023:06:15 10:16:00"),
        )
        .expect("write");

        let report = run_directory(temp.path(), &RunOptions::default(), &FsProbe).expect("run");
        assert_eq!(report.renamed, 1);
        assert_eq!(listing(temp.path()), vec!["20230615_101600-photo.jpg"]);
    }

    #[test]
    fn after_canonicalization_names_sort_by_capture_time() {
        let temp = tempdir().expect("tempdir");
        touch(temp.path(), "20220101_100000.jpg");
        touch(temp.path(), "20220101_090000.jpg");
        touch(temp.path(), "IMG_20220101_080000.jpg");

        run_directory(temp.path(), &RunOptions::default(), &FakeProbe::default()).expect("run");
        let items = list_work_items(temp.path(), &Config::default().all_extensions())
            .expect("list");
        let unmarked: Vec<&str> = items.iter().map(|i| i.unmarked_name.as_str()).collect();
        assert_eq!(
            unmarked,
            vec![
                "20220101_080000.jpg",
                "20220101_090000.jpg",
                "20220101_100000.jpg",
            ]
        );
    }

    #[test]
    fn missing_directory_is_fatal() {
        let temp = tempdir().expect("tempdir");
        assert!(run_directory(
            &temp.path().join("missing"),
            &RunOptions::default(),
            &FakeProbe::default()
        )
        .is_err());
    }
}
