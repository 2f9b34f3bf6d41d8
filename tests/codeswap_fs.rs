mod common;
use crate::common::{init_tracing, AldevConfigBuilder};

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aldev::codeswap::{inline_marker, run_codeswap, CodeSwapper};
use aldev::fs::RealFileSystem;

const IMPORT: &str = "import { Button } from 'goaldr'\n";

fn project(root: &Path) {
    fs::create_dir_all(root.join("src/routes")).unwrap();
    fs::create_dir_all(root.join("src/node_modules/goaldr")).unwrap();
    fs::create_dir_all(root.join("src/assets")).unwrap();
    fs::write(root.join("src/main.ts"), IMPORT).unwrap();
    fs::write(root.join("src/routes/home.ts"), IMPORT).unwrap();
    fs::write(root.join("src/node_modules/goaldr/index.ts"), IMPORT).unwrap();
    fs::write(root.join("src/assets/logo.svg"), "<svg/>").unwrap();
}

fn swapper(root: &Path, finished: Arc<AtomicBool>) -> CodeSwapper {
    let from = root.join("src");
    let cfg = AldevConfigBuilder::new("shop")
        .with_codeswap(
            from.to_str().unwrap(),
            "*.ts",
            "from 'goaldr'",
            "from '../../goaldr/src'",
        )
        .build();
    CodeSwapper::new(cfg, Arc::new(RealFileSystem), finished)
        .unwrap()
        .without_go_mod_tidy()
}

#[tokio::test]
async fn swapping_forward_then_back_restores_the_files() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let swapper = swapper(dir.path(), Arc::new(AtomicBool::new(false)));

    swapper.swap_all(false, true).await.unwrap();

    let swapped = fs::read_to_string(dir.path().join("src/routes/home.ts")).unwrap();
    assert_eq!(
        swapped,
        format!("import {{ Button }} from '../../goaldr/src'{}\n", inline_marker())
    );
    // Skipped dirs are left alone.
    assert_eq!(
        fs::read_to_string(dir.path().join("src/node_modules/goaldr/index.ts")).unwrap(),
        IMPORT
    );

    swapper.swap_all(true, true).await.unwrap();

    for file in ["src/main.ts", "src/routes/home.ts"] {
        assert_eq!(fs::read_to_string(dir.path().join(file)).unwrap(), IMPORT);
    }
}

#[tokio::test]
async fn the_plan_only_watches_folders_holding_matches() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let swapper = swapper(dir.path(), Arc::new(AtomicBool::new(false)));

    let plan = swapper.plan();
    assert_eq!(plan.sets.len(), 1);
    assert_eq!(plan.sets[0].files.len(), 2);
    assert_eq!(
        plan.watched_folders,
        vec![dir.path().join("src"), dir.path().join("src/routes")]
    );
}

#[tokio::test]
async fn a_finished_swapper_only_rolls_back() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let finished = Arc::new(AtomicBool::new(false));
    let swapper = swapper(dir.path(), Arc::clone(&finished));

    swapper.swap_all(false, true).await.unwrap();
    finished.store(true, Ordering::SeqCst);
    swapper.swap_all(true, true).await.unwrap();

    // Late forward swap after the stop.
    swapper.swap_all(false, false).await.unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("src/main.ts")).unwrap(),
        IMPORT
    );
}

#[tokio::test]
async fn a_failed_first_swap_still_restores_the_files_it_touched() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.ts"), "import 'lib'").unwrap();
    // Not UTF-8: reading it fails after a.ts was swapped.
    fs::write(src.join("b.ts"), b"import 'lib' \xff\xfe").unwrap();

    let cfg = AldevConfigBuilder::new("shop")
        .with_codeswap(src.to_str().unwrap(), "*.ts", "'lib'", "'../lib'")
        .build();

    let res = run_codeswap(cfg, Arc::new(RealFileSystem)).await;

    assert!(res.is_err());
    assert_eq!(fs::read_to_string(src.join("a.ts")).unwrap(), "import 'lib'");
}
