use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

/// logtally 개발 태스크
#[derive(Parser)]
#[command(name = "xtask")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 웹 서버 접근 로그와 비슷한 테스트 로그를 계속 생성
    GenLogs {
        /// 로그를 기록할 파일 (이미 있으면 이어서 씀)
        #[arg(short, long)]
        output_file: PathBuf,

        /// 로그 로테이션 주기 (초)
        #[arg(short, long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
        rotation_secs: u64,

        /// 생성할 라인 수 (생략하면 무한)
        #[arg(short, long)]
        count: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::GenLogs {
            output_file,
            rotation_secs,
            count,
        } => gen_logs(&output_file, Duration::from_secs(rotation_secs), count),
    }
}

/// 응답 크기 범위 (바이트)
const RESPONSE_BYTES: std::ops::RangeInclusive<u32> = 64..=1024;

const METHODS: &[(&str, u32)] = &[("GET", 95), ("POST", 5)];
const STATUS_CODES: &[(u16, u32)] = &[(200, 90), (404, 5), (500, 1)];
const ROUTES: &[(&str, u32)] = &[("/", 50), ("/library", 20), ("/blog", 20), ("/questions", 5)];

/// 가중치 분포를 한 번만 만들어 두고 라인마다 재사용합니다.
struct LineGenerator {
    methods: WeightedIndex<u32>,
    statuses: WeightedIndex<u32>,
    routes: WeightedIndex<u32>,
}

impl LineGenerator {
    fn new() -> Result<Self> {
        Ok(Self {
            methods: WeightedIndex::new(METHODS.iter().map(|(_, w)| *w))?,
            statuses: WeightedIndex::new(STATUS_CODES.iter().map(|(_, w)| *w))?,
            routes: WeightedIndex::new(ROUTES.iter().map(|(_, w)| *w))?,
        })
    }

    /// `<ip>\t<METHOD> <route>\t<status>\t<bytes>\n` 형식의 라인 하나
    fn line<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let ip = Ipv4Addr::from(rng.random_range(1..=u32::MAX));
        let method = METHODS[self.methods.sample(rng)].0;
        let route = ROUTES[self.routes.sample(rng)].0;
        let status = STATUS_CODES[self.statuses.sample(rng)].0;
        let bytes = rng.random_range(RESPONSE_BYTES);
        format!("{ip}\t{method} {route}\t{status}\t{bytes}\n")
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

/// 현재 파일을 `<name>.<unix 초>`로 옮기고 같은 경로에 새 파일을 엽니다.
fn rotate(path: &Path) -> Result<File> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let mut rotated = path.as_os_str().to_owned();
    rotated.push(format!(".{secs}"));

    std::fs::rename(path, &rotated)
        .with_context(|| format!("failed to rotate {}", path.display()))?;
    println!("rotated {} -> {}", path.display(), Path::new(&rotated).display());
    open_append(path)
}

fn gen_logs(path: &Path, rotation: Duration, count: Option<u64>) -> Result<()> {
    let generator = LineGenerator::new()?;
    let mut rng = rand::rng();
    let mut file = open_append(path)?;
    let mut last_rotation = Instant::now();
    let mut written = 0u64;

    println!("writing to {} (rotation every {}s)", path.display(), rotation.as_secs());

    while count.is_none_or(|limit| written < limit) {
        if last_rotation.elapsed() > rotation {
            file = rotate(path)?;
            last_rotation = Instant::now();
        }

        file.write_all(generator.line(&mut rng).as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        written += 1;

        std::thread::sleep(Duration::from_millis(rng.random_range(1..=10) * 10));
    }

    println!("wrote {written} lines");
    Ok(())
}
