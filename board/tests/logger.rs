use board::log::FileSink;
use log::LevelFilter;
use tempdir::TempDir;

#[test]
fn logging() {
    const TARGET: &str = "[INFO] logger - Test `logging`";

    let dir = TempDir::new("tricore-board-log").unwrap();
    let path = dir.path().join("board.log");
    let file = std::fs::File::create(&path).unwrap();

    board::log::init(
        LevelFilter::Off,
        Some(FileSink {
            file,
            max_level: LevelFilter::Info,
        }),
        64,
    );
    board::log::set_auto_flush(false);

    log::info!("Test `logging`");
    log::debug!("filtered out");
    board::log::flush();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().collect::<Vec<_>>(), [TARGET]);
}
