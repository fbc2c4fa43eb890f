//! Minimal DXF interchange: `LINE` entities only.
//!
//! The writer emits an empty header section and an entities section. The
//! reader is tolerant: unknown group codes are skipped and a malformed
//! numeric field only loses that field.

use super::{StorageError, StorageResult};
use crate::color::AciColor;
use crate::geometry::Segment;
use kurbo::Point;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Write segments as a DXF document.
pub fn write_dxf<W: Write>(writer: &mut W, segments: &[Segment]) -> io::Result<()> {
    writer.write_all(b"0\nSECTION\n2\nHEADER\n0\nENDSEC\n")?;
    writer.write_all(b"0\nSECTION\n2\nENTITIES\n")?;

    for segment in segments {
        let aci = AciColor::nearest(segment.color);
        write!(writer, "0\nLINE\n8\n0\n62\n{}\n", aci.index())?;
        write!(
            writer,
            "10\n{:.6}\n20\n{:.6}\n30\n0.0\n11\n{:.6}\n21\n{:.6}\n31\n0.0\n",
            segment.start.x, segment.start.y, segment.end.x, segment.end.y
        )?;
    }

    writer.write_all(b"0\nENDSEC\n0\nEOF\n")?;
    Ok(())
}

/// Fields of a `LINE` record being read.
struct LineRecord {
    start: Point,
    end: Point,
    color: i32,
}

impl Default for LineRecord {
    fn default() -> Self {
        Self {
            start: Point::ZERO,
            end: Point::ZERO,
            color: AciColor::White.index(),
        }
    }
}

impl LineRecord {
    fn apply(&mut self, code: i32, value: &str, line_no: usize) {
        match code {
            10 | 20 | 11 | 21 => {
                let Ok(v) = value.parse::<f64>() else {
                    log::warn!("DXF line {}: malformed coordinate {:?} for code {}", line_no, value, code);
                    return;
                };
                match code {
                    10 => self.start.x = v,
                    20 => self.start.y = v,
                    11 => self.end.x = v,
                    _ => self.end.y = v,
                }
            }
            62 => match value.parse::<i32>() {
                Ok(index) => self.color = index,
                Err(_) => log::warn!("DXF line {}: malformed colour {:?}", line_no, value),
            },
            _ => {}
        }
    }

    fn into_segment(self) -> Segment {
        Segment::with_color(self.start, self.end, AciColor::from_index(self.color).color())
    }
}

/// Next raw line, decoded lossily so stray non-UTF-8 bytes only spoil the
/// field they appear in.
fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Read every `LINE` entity from a DXF document.
pub fn read_dxf<R: BufRead>(mut reader: R) -> io::Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut record: Option<LineRecord> = None;
    let mut buf = Vec::new();
    let mut code_idx = 0;

    while let Some(code_line) = next_line(&mut reader, &mut buf)? {
        let Some(value_line) = next_line(&mut reader, &mut buf)? else {
            break;
        };
        let value = value_line.trim();
        let line_no = code_idx + 2;
        code_idx += 2;

        let code = match code_line.trim().parse::<i32>() {
            Ok(code) => code,
            Err(_) => {
                log::warn!("DXF line {}: malformed group code {:?}", line_no - 1, code_line.trim());
                continue;
            }
        };

        if code == 0 {
            if let Some(done) = record.take() {
                segments.push(done.into_segment());
            }
            match value {
                "LINE" => record = Some(LineRecord::default()),
                "EOF" => break,
                _ => {}
            }
            continue;
        }

        if let Some(current) = record.as_mut() {
            current.apply(code, value, line_no);
        }
    }

    if let Some(done) = record {
        segments.push(done.into_segment());
    }

    Ok(segments)
}

/// Write segments to a DXF file.
pub fn save_dxf(path: &Path, segments: &[Segment]) -> StorageResult<()> {
    let file = File::create(path).map_err(|e| StorageError::from_io(path, "create", e))?;
    let mut writer = BufWriter::new(file);
    write_dxf(&mut writer, segments)
        .and_then(|_| writer.flush())
        .map_err(|e| StorageError::from_io(path, "write", e))?;
    log::info!("Saved {} segments to {}", segments.len(), path.display());
    Ok(())
}

/// Read segments from a DXF file.
pub fn load_dxf(path: &Path) -> StorageResult<Vec<Segment>> {
    let file = File::open(path).map_err(|e| StorageError::from_io(path, "open", e))?;
    let segments = read_dxf(BufReader::new(file)).map_err(|e| StorageError::from_io(path, "read", e))?;
    log::info!("Loaded {} segments from {}", segments.len(), path.display());
    Ok(segments)
}
