use log::LevelFilter;
use log4rs::{
    Config,
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            RollingFileAppender,
            policy::compound::{
                CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
            },
        },
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

const ROLL_AT_BYTES: u64 = 10 * 1024 * 1024;
const ARCHIVE_COUNT: u32 = 3;

const CONSOLE_PATTERN: &str = "{h({l})} {m}{n}";
const FILE_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%S%.3f)} {l} {t} - {m}{n}";

fn file_appender() -> RollingFileAppender {
    let log_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grid-wars.log".to_string());
    let archive_pattern = std::env::var("LOG_ARCHIVE_PATTERN")
        .unwrap_or_else(|_| "logs/grid-wars.{}.log.gz".to_string());

    let roller = FixedWindowRoller::builder()
        .build(&archive_pattern, ARCHIVE_COUNT)
        .unwrap();
    let policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(ROLL_AT_BYTES)),
        Box::new(roller),
    );

    RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(log_path, Box::new(policy))
        .unwrap()
}

pub fn init_logger() {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender())),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Info)))
                .build("console", Box::new(console)),
        )
        .build(
            Root::builder()
                .appender("file")
                .appender("console")
                .build(LevelFilter::Trace),
        )
        .unwrap();

    let _handle = log4rs::init_config(config).expect("Failed to initialize logger");
}
