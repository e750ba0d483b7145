use std::fs;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;

use vimarsha_pdf::analytics::{self, Employee, Material, MaterialFilter};
use vimarsha_pdf::model::Report;
use vimarsha_pdf::reports::{company, engineer, inspection, material};
use vimarsha_pdf::{DirSource, Error, LogoCache, RenderConfig, generate_report};

#[derive(Parser)]
#[command(name = "vimarsha-pdf")]
#[command(version)]
#[command(about = "Render Vimarsha track-fittings reports as PDF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Directory holding the banner logos
    #[arg(long, value_name = "DIR", default_value = "public")]
    assets: PathBuf,

    /// Directory the PDF is written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Override the generated file name
    #[arg(long)]
    file_name: Option<String>,

    /// Minutes east of UTC for printed times [default: host zone]
    #[arg(long, value_name = "MINUTES", allow_negative_numbers = true)]
    utc_offset: Option<i32>,
}

impl Common {
    fn offset(&self) -> Result<FixedOffset, Error> {
        match self.utc_offset {
            None => Ok(*Local::now().offset()),
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| Error::InvalidInput(format!("UTC offset out of range: {minutes}"))),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Engineer verification report for one material
    Engineer {
        /// Material record (JSON)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        #[command(flatten)]
        common: Common,
    },

    /// Druva inspection report
    Inspection {
        /// Inspection node (JSON)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        #[command(flatten)]
        common: Common,
    },

    /// Manufacturer company report
    Company {
        /// Employee list (JSON array)
        #[arg(long, value_name = "FILE")]
        employees: PathBuf,
        /// Material list (JSON array)
        #[arg(long, value_name = "FILE")]
        materials: PathBuf,
        #[arg(long)]
        company_id: String,
        /// Earliest manufacturing date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest manufacturing date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Fitting type
        #[arg(long = "type")]
        fitting_type: Option<String>,
        #[command(flatten)]
        common: Common,
    },

    /// QR scan history of one material
    Material {
        /// Material with its scans (JSON)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        #[command(flatten)]
        common: Common,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn build_report(command: &Commands) -> Result<(Report, &Common), Error> {
    match command {
        Commands::Engineer { input, common } => {
            let data: engineer::EngineerReportData = read_json(input)?;
            Ok((
                engineer::build(&data, common.offset()?, common.file_name.as_deref()),
                common,
            ))
        }
        Commands::Inspection { input, common } => {
            let row: inspection::InspectionRow = read_json(input)?;
            Ok((
                inspection::build(&row, Utc::now(), common.offset()?, common.file_name.as_deref()),
                common,
            ))
        }
        Commands::Company {
            employees,
            materials,
            company_id,
            from,
            to,
            fitting_type,
            common,
        } => {
            let employees: Vec<Employee> = read_json(employees)?;
            let materials: Vec<Material> = read_json(materials)?;
            let groups = analytics::group_by_company(&employees, &materials);
            let group = groups
                .iter()
                .find(|g| &g.company_id == company_id)
                .ok_or_else(|| Error::InvalidInput(format!("unknown company: {company_id}")))?;
            let filter = MaterialFilter {
                from: *from,
                to: *to,
                fitting_type: fitting_type.clone(),
            };
            let mut report = company::build_filtered(group, &filter, Utc::now(), common.offset()?);
            if let Some(name) = &common.file_name {
                report.file_name = name.clone();
            }
            Ok((report, common))
        }
        Commands::Material { input, common } => {
            let history: material::MaterialScanHistory = read_json(input)?;
            Ok((
                material::build(&history, common.offset()?, common.file_name.as_deref()),
                common,
            ))
        }
    }
}

fn run(cli: &Cli) -> Result<PathBuf, Error> {
    let (report, common) = build_report(&cli.command)?;
    let source = DirSource::new(&common.assets);
    let cache = LogoCache::new();
    generate_report(
        &report,
        &source,
        &cache,
        &RenderConfig::default(),
        &common.output,
    )
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
