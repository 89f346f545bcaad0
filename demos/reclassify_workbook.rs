use cartera_reclassifier::*;
use std::io::Cursor;
use std::path::Path;

const PUC: &str = "codigo_cuenta,Homologo APP
4135,ADMINISTRACION
1305,INTERESES
4140,PARQUEADEROS
2705,TOTAL A PAGAR
anticipos,SALDO A FAVOR
9999,
";

const CARTERA: &str = "codigo,nombre,interior,total,c_4135,c_1305,c_4140,c_2705,c_9999,anticipos
A101,Ana Ruiz,1,1580,1200,80,300,1580,15,
A102,Luis Mora,1,0,0,0,0,0,0,250
B201,Eva Gil,2,920,900,20,0,920,0,
B202,Juan Paz,2,2450,2000,150,300,2450,0,
C301,Mar Sol,3,40,40,0,0,40,0,
";

const QUITAR: &str = "codigo_retirar
C301
";

fn sample_workbook() -> Result<Workbook> {
    Ok(Workbook::new()
        .with_sheet(read_table_csv("PUC", Cursor::new(PUC))?)
        .with_sheet(read_table_csv("CARTERA", Cursor::new(CARTERA))?)
        .with_sheet(read_table_csv("Quitar", Cursor::new(QUITAR))?))
}

fn load(path: &Path) -> Result<Workbook> {
    if path.is_dir() {
        load_workbook_dir(path)
    } else {
        load_workbook_xlsx(path)
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let workbook = match args.first() {
        Some(path) => load(Path::new(path))?,
        None => sample_workbook()?,
    };
    let cutoff_date = args.get(1).map(String::as_str).unwrap_or("31/01/2025");

    let pipeline = ReclassificationPipeline::default();
    let outcome = pipeline.run(&workbook)?;

    println!("=== Pipeline events ===");
    for event in &outcome.events {
        println!("  • {}", event.describe());
    }

    println!("\n=== {} ===", pipeline.config().summary_csv_name);
    print!("{}", summary_to_csv_string(&outcome.summary)?);

    let arrears = pipeline.arrears_report(&workbook, cutoff_date)?;
    for event in &arrears.events {
        println!("\n  • {}", event.describe());
    }
    if let Some(report) = arrears.outcome.report() {
        let document = report.to_text_document();
        println!(
            "\n=== {} ({} pages) ===",
            document.name,
            document.page_count()
        );
        println!("{}", document.render());
    }

    Ok(())
}
