#![cfg(not(tarpaulin_include))]

use situation_report::category::Filter;
use situation_report::config::ReportConfig;
use situation_report::downloader::{export_filename, to_csv};
use situation_report::report::{ReportView, caption};
use situation_report::session::ReportSession;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

struct Args {
    input: PathBuf,
    filter: Filter,
    export: Option<PathBuf>,
    csv: Option<PathBuf>,
    chart: Option<PathBuf>,
    json: bool,
}

fn usage(program: &str) {
    eprintln!(
        "Usage: {} <arquivo.csv|arquivo.xlsx> [--filtro <nome>] [--export <caminho>|auto] [--csv <caminho>] [--chart <caminho>] [--json]",
        program
    );
    let names: Vec<&str> = Filter::options().iter().map(|f| f.name()).collect();
    eprintln!("Filtros: {}", names.join(", "));
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut input = None;
    let mut filter = Filter::All;
    let mut export = None;
    let mut csv = None;
    let mut chart = None;
    let mut json = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("missing value for {}", flag))
        };
        match arg.as_str() {
            "--filtro" | "-f" => filter = value(arg)?.parse().map_err(|e| format!("{}", e))?,
            "--export" | "-o" => export = Some(PathBuf::from(value(arg)?)),
            "--csv" => csv = Some(PathBuf::from(value(arg)?)),
            "--chart" => chart = Some(PathBuf::from(value(arg)?)),
            "--json" => json = true,
            other if other.starts_with('-') => return Err(format!("unknown option {}", other)),
            other if input.is_none() => input = Some(PathBuf::from(other)),
            other => return Err(format!("unexpected argument {}", other)),
        }
    }

    Ok(Args {
        input: input.ok_or("missing input file")?,
        filter,
        export,
        csv,
        chart,
        json,
    })
}

fn print_report(view: &ReportView) {
    let m = &view.metrics;
    println!("== Métricas Principais ({}) ==", view.filter);
    println!("  Total Filtrado: {}", m.total_filtrado);
    match (m.categorias, m.categoria_selecionada) {
        (Some(n), _) => println!("  Categorias: {}", n),
        (None, Some(category)) => println!("  Categoria Selecionada: {}", category),
        (None, None) => {}
    }
    println!("  Registros no Arquivo: {}", m.registros_no_arquivo);
    println!("  Colunas com Dados: {}", m.colunas_com_dados);

    if let Some(chart) = &view.chart {
        println!();
        if chart.title.is_empty() {
            println!("== Gráfico de comparação ==");
        } else {
            println!("== {} ==", chart.title);
        }
        for label in chart.slice_labels() {
            println!("  {}", label);
        }
    }

    for notice in &view.notices {
        println!("! {}", notice);
    }

    println!();
    println!("== Tabela de Dados Filtrada ==");
    println!("  {}", view.table.columns.join(" | "));
    for row in &view.table.rows {
        println!("  {}", row.join(" | "));
    }
    if let Some(caption) = &view.table_caption {
        println!("  {}", caption);
    }

    for section in &view.details {
        println!();
        println!("== {} ({}) ==", section.category, section.entries.len());
        for entry in &section.entries {
            match &entry.reason {
                Some(reason) => println!("  [{}] {} | Motivo: {}", entry.row, entry.value, reason),
                None => println!("  [{}] {}", entry.row, entry.value),
            }
        }
        if let Some(r) = section.revocations {
            println!(
                "  Total de Revogações: {} | Com Motivo: {} | Sem Motivo: {}",
                r.total, r.com_motivo, r.sem_motivo
            );
        }
    }

    if !view.summary.is_empty() {
        println!();
        println!("== Resumo ==");
        for row in &view.summary {
            println!("  {}: {} ({})", row.categoria, row.quantidade, row.percentual);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let s = Instant::now();
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("cli");

    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            usage(program);
            std::process::exit(2);
        }
    };

    let config = ReportConfig::load()?;
    let mut session = ReportSession::new(config);

    let bytes = std::fs::read(&args.input)?;
    let name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.to_string_lossy().into_owned());

    let view = match session.run(&name, &bytes, args.filter) {
        Ok(view) => view,
        Err(e) => {
            eprintln!("{}", e);
            if let Some(columns) = e.available_columns() {
                eprintln!("Colunas encontradas no arquivo:");
                for column in columns {
                    eprintln!("  - {}", column);
                }
            }
            std::process::exit(1);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_report(&view);
        println!();
        println!("{}", caption(&name));
    }

    if let Some(path) = &args.export {
        let file = view.export()?;
        let path = if path.as_os_str() == "auto" {
            PathBuf::from(export_filename(view.filter))
        } else {
            path.clone()
        };
        std::fs::write(&path, &file.bytes)?;
        eprintln!("Exported {} rows to {}", view.table.row_count(), path.display());
    }

    if let Some(path) = &args.csv {
        std::fs::write(path, to_csv(&view.table)?)?;
        eprintln!("Wrote CSV to {}", path.display());
    }

    if let Some(path) = &args.chart {
        write_chart(&view, session.config(), path)?;
    }

    log::debug!("Total elapsed time: {:.1} seconds", s.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(feature = "web")]
fn write_chart(
    view: &ReportView,
    config: &ReportConfig,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    use situation_report::graph::{GraphOptions, render_png};

    match &view.chart {
        Some(spec) => {
            let options = GraphOptions {
                width: config.chart_width,
                height: config.chart_height,
            };
            std::fs::write(path, render_png(spec, &options)?)?;
            eprintln!("Wrote chart to {}", path.display());
        }
        None => eprintln!("No chart for filter {}", view.filter),
    }
    Ok(())
}

#[cfg(not(feature = "web"))]
fn write_chart(
    _view: &ReportView,
    _config: &ReportConfig,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    Err(format!(
        "Chart rendering requires the 'web' feature (requested {})",
        path.display()
    )
    .into())
}
