//! Test helpers: in-memory archives and hand-built tables.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crash_core::models::{
    RawTable, COL_ALCOHOL, COL_COLLISION, COL_DATE, COL_ID, COL_REGION, COL_SURFACE, COL_TIME,
};
use zip::write::FileOptions;
use zip::CompressionMethod;

/// Render an HTML table the way the police exports look.
pub fn html_table(headers: &[&str], rows: &[&[&str]]) -> String {
    let mut html = String::from("<html><head><meta charset=\"windows-1250\"></head><body>\n");
    html.push_str("<table border=\"1\">\n<tr>");
    for header in headers {
        html.push_str(&format!("<th>{header}</th>"));
    }
    html.push_str("</tr>\n");
    for row in rows {
        html.push_str("<tr>");
        for cell in *row {
            html.push_str(&format!("<td>{cell}</td>"));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n</body></html>\n");
    html
}

/// Encode `text` as Windows-1250.
pub fn encode_1250(text: &str) -> Vec<u8> {
    let (bytes, _, _) = encoding_rs::WINDOWS_1250.encode(text);
    bytes.into_owned()
}

fn options() -> FileOptions<'static, ()> {
    FileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Write a ZIP with explicit directory entries `dirs` and file `entries`.
pub fn write_archive(dir: &Path, dirs: &[&str], entries: &[(&str, Vec<u8>)]) -> PathBuf {
    let path = dir.join("data.zip");
    let file = File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for name in dirs {
        zip.add_directory(*name, options()).unwrap();
    }
    for (name, bytes) in entries {
        zip.start_file(*name, options()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
    path
}

/// One accident row for [`accident_table`].
#[derive(Debug, Clone)]
pub struct AccidentRow {
    pub partition: &'static str,
    pub id: &'static str,
    pub date: &'static str,
    pub time: &'static str,
    pub region: &'static str,
    pub collision: &'static str,
    pub alcohol: &'static str,
    pub surface: &'static str,
}

impl Default for AccidentRow {
    fn default() -> Self {
        Self {
            partition: "2023",
            id: "A1",
            date: "01.01.2023",
            time: "1200",
            region: "0",
            collision: "1",
            alcohol: "1",
            surface: "1",
        }
    }
}

/// Build a raw accident table with the columns the pipeline reads.
pub fn accident_table(rows: &[AccidentRow]) -> RawTable {
    let headers = [
        COL_ID,
        COL_DATE,
        COL_TIME,
        COL_REGION,
        COL_COLLISION,
        COL_ALCOHOL,
        COL_SURFACE,
        "p36",
    ];
    let mut table = RawTable::new(headers.iter().map(|h| h.to_string()).collect());
    for row in rows {
        table.push_row(
            row.partition,
            [
                row.id,
                row.date,
                row.time,
                row.region,
                row.collision,
                row.alcohol,
                row.surface,
                "4",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        );
    }
    table
}
