use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use resume_pager::{FontMetrics, PageGeometry, TextMeasurer, from_json, paginate_document};

/// Lay a résumé out onto A4 pages and export it as PDF
#[derive(Parser, Debug)]
#[command(name = "resume-pager")]
#[command(version, about, long_about = None)]
struct Args {
    /// Interchange JSON file ({"modules": [...], "timestamp": ...})
    input: PathBuf,

    /// Output PDF path (defaults to the input with a .pdf extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Container width in CSS px the preview is laid out at
    #[arg(long)]
    width: Option<f32>,

    /// Print the page/section assignment instead of exporting
    #[arg(long)]
    pages: bool,
}

fn print_pages(args: &Args) -> resume_pager::Result<()> {
    let imported = from_json(&std::fs::read_to_string(&args.input)?)?;
    let settings = imported.settings.unwrap_or_default();
    let geometry = PageGeometry::a4();
    let width = args.width.unwrap_or(geometry.width);
    let mut measurer = TextMeasurer::new(FontMetrics::from_env());
    let (_, pagination) = paginate_document(&imported.document, &settings, &geometry, width, &mut measurer)?;

    println!(
        "{} page(s), usable height {:.1}px, section margin {:.1}px",
        pagination.page_count(),
        pagination.usable_height,
        pagination.section_margin
    );
    for (i, page) in pagination.pages.iter().enumerate() {
        let marker = if page.overflows(pagination.usable_height) { " (overflows)" } else { "" };
        println!("page {}: {:.1}px{marker}", i + 1, page.height);
        for block in &page.blocks {
            let title = imported
                .document
                .section(&block.section_id)
                .map(|s| s.title.as_str())
                .unwrap_or("");
            println!("  {:<12} {:>8.1}px  {title}", block.section_id.to_string(), block.height);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let result = if args.pages {
        print_pages(&args)
    } else {
        let output = args.output.clone().unwrap_or_else(|| args.input.with_extension("pdf"));
        resume_pager::convert_json_to_pdf(&args.input, &output, args.width)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
