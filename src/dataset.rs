use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

use pagetable::ColumnDef;

use crate::app::AppError;

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

/// One record of a loaded file, every cell already stringified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<String>,
}

impl Row {
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }
}

struct Column {
    name: String,
    data: Vec<String>,
}

/// Rows of a tabular file plus its header and the widest value per column.
#[derive(Debug, Default)]
pub struct Dataset {
    pub name: String,
    pub headers: Vec<String>,
    pub widths: Vec<usize>,
    pub rows: Vec<Row>,
}

impl Dataset {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file_type = Self::get_file_type(path)?;
        let frame = match file_type {
            FileType::CSV => Self::load_csv(path)?,
            FileType::PARQUET => Self::load_parquet(path)?,
            FileType::ARROW => Self::load_arrow(path)?,
        };

        // Each column is converted to strings on its own rayon task.
        let start_time = Instant::now();
        let df = frame.collect()?;
        let columns = df
            .get_column_names()
            .par_iter()
            .map(|name| Self::load_column(&df, name))
            .collect::<Result<Vec<Column>, PolarsError>>()?;

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        let dataset = Self::from_columns(name, columns);
        info!(
            "Loading {} rows x {} columns took {}ms",
            dataset.rows.len(),
            dataset.headers.len(),
            start_time.elapsed().as_millis()
        );
        Ok(dataset)
    }

    /// Builds a dataset from column names and row-major cells.
    pub fn from_rows(
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in rows.iter() {
            for (idx, cell) in row.iter().enumerate().take(widths.len()) {
                widths[idx] = std::cmp::max(widths[idx], cell.chars().count());
            }
        }
        Self {
            name: name.into(),
            headers,
            widths,
            rows: rows.into_iter().map(|cells| Row { cells }).collect(),
        }
    }

    fn from_columns(name: String, columns: Vec<Column>) -> Self {
        let nrows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        let rows = (0..nrows)
            .into_par_iter()
            .map(|ridx| columns.iter().map(|c| c.data[ridx].clone()).collect())
            .collect();
        let headers = columns.into_iter().map(|c| c.name).collect();
        Self::from_rows(name, headers, rows)
    }

    /// One column definition per header, reading the cell at the same position.
    pub fn columns(&self) -> Vec<ColumnDef<Row>> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                ColumnDef::new(name.clone(), move |row: &Row| row.cell(idx).to_string())
            })
            .collect()
    }

    fn load_column(df: &DataFrame, col_name: &str) -> Result<Column, PolarsError> {
        let col = df.column(col_name)?.cast(&DataType::String)?;
        let series = col.str()?;
        let mut data = Vec::with_capacity(series.len());

        for value in series.into_iter() {
            let ss = match value {
                Some(s) => s.replace("\r\n", " ↵ ").replace('\n', " ↵ "),
                None => String::from("∅"),
            };
            data.push(ss);
        }
        debug!("Column \"{col_name}\": {} rows", data.len());

        Ok(Column {
            name: col_name.to_string(),
            data,
        })
    }

    fn get_file_type(path: &Path) -> Result<FileType, AppError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::FileNotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => AppError::PermissionDenied(path.to_path_buf()),
            _ => AppError::Io(e),
        })?;
        if !metadata.is_file() {
            return Err(AppError::LoadingFailed(format!(
                "{} is not a file",
                path.display()
            )));
        }
        Self::detect_file_type(path)
    }

    fn detect_file_type(path: &Path) -> Result<FileType, AppError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(AppError::UnknownFileType(path.to_path_buf())),
        }
    }

    fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
    }

    fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("pagetable-{}-{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_csv_as_string_rows() {
        let path = write_fixture("cities.csv", "name,population\nVienna,2000000\nGraz,290000\n");
        let dataset = Dataset::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(dataset.headers, vec!["name", "population"]);
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.rows[1].cells, vec!["Graz", "290000"]);
        assert_eq!(dataset.widths, vec![6, 10]);
        assert!(dataset.name.ends_with("cities.csv"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let path = write_fixture("notes.txt", "hello");
        let err = Dataset::load(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err, AppError::UnknownFileType(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Dataset::load(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, AppError::FileNotFound(_)));
    }

    #[test]
    fn columns_read_cells_by_position() {
        let dataset = Dataset::from_rows(
            "mem",
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "22".into()], vec!["333".into()]],
        );
        let columns = dataset.columns();
        assert_eq!(columns[1].id(), "b");
        assert_eq!(columns[1].value(&dataset.rows[0]), "22");
        assert_eq!(columns[1].value(&dataset.rows[1]), "");
        assert_eq!(dataset.widths, vec![3, 2]);
    }
}
