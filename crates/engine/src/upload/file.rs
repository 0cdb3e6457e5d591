use std::path::Path;

use sha2::{Digest, Sha256};

use super::UploadError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Delimited text formats accepted for bulk uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
}

impl FileFormat {
    pub fn from_file_name(file_name: &str) -> Result<Self, UploadError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            _ => Err(UploadError::UnsupportedFormat(file_name.to_string())),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Tsv => "text/tab-separated-values",
        }
    }

    fn delimiter(self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }
}

/// A local file picked for bulk upload, held in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    file_name: String,
    format: FileFormat,
    bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let file_name = file_name.into();
        let format = FileFormat::from_file_name(&file_name)?;
        Ok(Self {
            file_name,
            format,
            bytes,
        })
    }

    pub async fn read(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| UploadError::Read(format!("invalid file path {}", path.display())))?
            .to_string();
        // Reject before reading a possibly large file.
        FileFormat::from_file_name(&file_name)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| UploadError::Read(format!("{}: {err}", path.display())))?;
        Self::new(file_name, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Hex encoded SHA-256 of the raw bytes.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Column names from the header row.
    ///
    /// The BOM is stripped, cells are trimmed and blank cells dropped. Fails
    /// with [`UploadError::EmptyColumns`] when nothing is left.
    pub fn columns(&self) -> Result<Vec<String>, UploadError> {
        let bytes = self.bytes.strip_prefix(UTF8_BOM).unwrap_or(&self.bytes[..]);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.format.delimiter())
            .from_reader(bytes);

        let mut record = csv::ByteRecord::new();
        let found = reader
            .read_byte_record(&mut record)
            .map_err(|err| UploadError::Read(format!("{}: {err}", self.file_name)))?;
        if !found {
            return Err(UploadError::EmptyColumns);
        }

        let columns: Vec<String> = record
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect();

        if columns.is_empty() {
            return Err(UploadError::EmptyColumns);
        }
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_trimmed_header_without_bom() {
        let file = UploadFile::new(
            "adjustments.csv",
            b"\xEF\xBB\xBFaccount_number , amount,,reason\n123,10,,typo\n".to_vec(),
        )
        .unwrap();
        assert_eq!(
            file.columns().unwrap(),
            vec!["account_number", "amount", "reason"]
        );
    }

    #[test]
    fn tab_separated_headers() {
        let file = UploadFile::new("outages.tsv", b"feeder\tstarts_on\n".to_vec()).unwrap();
        assert_eq!(file.columns().unwrap(), vec!["feeder", "starts_on"]);
    }

    #[test]
    fn quoted_header_cells_keep_commas() {
        let file = UploadFile::new("c.csv", b"\"name, full\",email\n".to_vec()).unwrap();
        assert_eq!(file.columns().unwrap(), vec!["name, full", "email"]);
    }

    #[test]
    fn blank_header_is_empty_columns() {
        let file = UploadFile::new("blank.csv", b" , ,\n1,2,3\n".to_vec()).unwrap();
        assert!(matches!(file.columns(), Err(UploadError::EmptyColumns)));

        let empty = UploadFile::new("empty.csv", Vec::new()).unwrap();
        assert!(matches!(empty.columns(), Err(UploadError::EmptyColumns)));
    }

    #[test]
    fn spreadsheets_are_unsupported() {
        assert!(matches!(
            UploadFile::new("book.xlsx", Vec::new()),
            Err(UploadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn checksum_is_sha256_hex() {
        let file = UploadFile::new("a.csv", b"abc".to_vec()).unwrap();
        assert_eq!(
            file.checksum(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(file.format().content_type(), "text/csv");
    }
}
