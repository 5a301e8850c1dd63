//! highD `*_tracks.csv` ingestion.
//!
//! Columns are read by position in the order highD ships them. Empty cells are
//! absent values; `frame`, `id` and `precedingId` must be present. A bad line is
//! reported with its line number and does not stop the rest of the file.

use acc_core::types::{TrajectoryRecord, VehicleId};
use anyhow::{anyhow, bail, Context, Result};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Column order of a highD tracks file.
pub const COLUMNS: [&str; 25] = [
    "frame",
    "id",
    "x",
    "y",
    "width",
    "height",
    "xVelocity",
    "yVelocity",
    "xAcceleration",
    "yAcceleration",
    "frontSightDistance",
    "backSightDistance",
    "dhw",
    "thw",
    "ttc",
    "precedingXVelocity",
    "precedingId",
    "followingId",
    "leftPrecedingId",
    "leftAlongsideId",
    "leftFollowingId",
    "rightPrecedingId",
    "rightAlongsideId",
    "rightFollowingId",
    "laneId",
];

/// Suffix of the per-recording track files.
pub const TRACKS_SUFFIX: &str = "_tracks.csv";

/// Records parsed from one file, plus the lines that could not be parsed.
#[derive(Debug, Default)]
pub struct TrackFile {
    pub path: PathBuf,
    pub records: Vec<TrajectoryRecord>,
    /// (1-based line number, reason)
    pub rejected: Vec<(usize, String)>,
}

fn cell<'a>(cells: &[&'a str], col: usize) -> Option<&'a str> {
    cells.get(col).copied().map(str::trim).filter(|c| !c.is_empty())
}

fn opt_f64(cells: &[&str], col: usize) -> Result<Option<f64>> {
    cell(cells, col)
        .map(|c| {
            c.parse::<f64>()
                .with_context(|| format!("column `{}`: not a number: {c:?}", COLUMNS[col]))
        })
        .transpose()
}

fn opt_i64(cells: &[&str], col: usize) -> Result<Option<i64>> {
    cell(cells, col)
        .map(|c| -> Result<i64> {
            // highD writes some integer columns as "3.0"
            let v = c.parse::<f64>().with_context(|| {
                format!("column `{}`: not an integer: {c:?}", COLUMNS[col])
            })?;
            if v.fract() != 0.0 {
                bail!("column `{}`: not an integer: {c:?}", COLUMNS[col]);
            }
            Ok(v as i64)
        })
        .transpose()
}

fn req_u64(cells: &[&str], col: usize) -> Result<u64> {
    let v = opt_i64(cells, col)?
        .ok_or_else(|| anyhow!("column `{}` is required", COLUMNS[col]))?;
    u64::try_from(v).with_context(|| format!("column `{}` is negative: {v}", COLUMNS[col]))
}

fn vehicle(cells: &[&str], col: usize) -> Result<VehicleId> {
    Ok(match opt_i64(cells, col)? {
        None => VehicleId::NONE,
        Some(v) => VehicleId(
            u64::try_from(v)
                .with_context(|| format!("column `{}` is negative: {v}", COLUMNS[col]))?,
        ),
    })
}

/// Parse one data line of a tracks file.
pub fn parse_line(line: &str) -> Result<TrajectoryRecord> {
    let cells: Vec<&str> = line.split(',').collect();
    if cells.len() < COLUMNS.len() {
        bail!("expected {} columns, found {}", COLUMNS.len(), cells.len());
    }

    Ok(TrajectoryRecord {
        frame: req_u64(&cells, 0)?,
        id: VehicleId(req_u64(&cells, 1)?),
        x: opt_f64(&cells, 2)?,
        y: opt_f64(&cells, 3)?,
        width: opt_f64(&cells, 4)?,
        height: opt_f64(&cells, 5)?,
        x_velocity: opt_f64(&cells, 6)?,
        y_velocity: opt_f64(&cells, 7)?,
        x_acceleration: opt_f64(&cells, 8)?,
        y_acceleration: opt_f64(&cells, 9)?,
        front_sight_distance: opt_f64(&cells, 10)?,
        back_sight_distance: opt_f64(&cells, 11)?,
        dhw: opt_f64(&cells, 12)?,
        thw: opt_f64(&cells, 13)?,
        ttc: opt_f64(&cells, 14)?,
        preceding_x_velocity: opt_f64(&cells, 15)?,
        preceding_id: VehicleId(req_u64(&cells, 16)?),
        following_id: vehicle(&cells, 17)?,
        left_preceding_id: vehicle(&cells, 18)?,
        left_alongside_id: vehicle(&cells, 19)?,
        left_following_id: vehicle(&cells, 20)?,
        right_preceding_id: vehicle(&cells, 21)?,
        right_alongside_id: vehicle(&cells, 22)?,
        right_following_id: vehicle(&cells, 23)?,
        lane_id: opt_i64(&cells, 24)?,
    })
}

/// Parse a whole tracks stream. The first line is the header.
///
/// A line that is not valid UTF-8 is rejected like any other bad line; only
/// I/O errors abort the stream.
pub fn parse_tracks<R: BufRead>(reader: R, path: &Path) -> Result<TrackFile> {
    let mut file = TrackFile {
        path: path.to_path_buf(),
        ..Default::default()
    };

    for (i, bytes) in reader.split(b'\n').enumerate().skip(1) {
        let line_no = i + 1;
        let bytes = bytes.with_context(|| format!("{}:{line_no}: read failed", path.display()))?;
        let line = match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => {
                warn!(path = %path.display(), line = line_no, error = %e, "rejected track line");
                file.rejected.push((line_no, format!("line is not valid UTF-8: {e}")));
                continue;
            }
        };
        let text = line.strip_suffix('\r').unwrap_or(&line);
        if text.trim().is_empty() {
            continue;
        }
        match parse_line(text) {
            Ok(rec) => file.records.push(rec),
            Err(e) => {
                warn!(path = %path.display(), line = line_no, error = %e, "rejected track line");
                file.rejected.push((line_no, format!("{e:#}")));
            }
        }
    }

    debug!(
        path = %path.display(),
        records = file.records.len(),
        rejected = file.rejected.len(),
        "tracks parsed"
    );
    Ok(file)
}

/// Load one tracks file from disk.
pub fn read_tracks(path: &Path) -> Result<TrackFile> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    parse_tracks(BufReader::new(f), path)
}

/// Expand inputs into track files: directories contribute every `*_tracks.csv`
/// they contain (sorted), plain paths are taken as-is.
pub fn collect_track_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("cannot list {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(TRACKS_SUFFIX))
                })
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "frame,id,x,y,width,height,xVelocity,yVelocity,xAcceleration,yAcceleration,frontSightDistance,backSightDistance,dhw,thw,ttc,precedingXVelocity,precedingId,followingId,leftPrecedingId,leftAlongsideId,leftFollowingId,rightPrecedingId,rightAlongsideId,rightFollowingId,laneId";

    const ROW: &str = "1,1,362.26,21.68,4.85,2.12,40.85,0.00,0.30,0.00,362.26,48.30,25.38,0.62,12.40,38.80,2,0,0,0,0,0,0,0,2";

    #[test]
    fn parses_a_full_row() {
        let rec = parse_line(ROW).unwrap();
        assert_eq!(rec.frame, 1);
        assert_eq!(rec.id, VehicleId(1));
        assert_eq!(rec.x, Some(362.26));
        assert_eq!(rec.x_velocity, Some(40.85));
        assert_eq!(rec.dhw, Some(25.38));
        assert_eq!(rec.thw, Some(0.62));
        assert_eq!(rec.preceding_x_velocity, Some(38.80));
        assert_eq!(rec.preceding_id, VehicleId(2));
        assert_eq!(rec.following_id, VehicleId::NONE);
        assert_eq!(rec.lane_id, Some(2));
    }

    #[test]
    fn empty_cells_are_absent() {
        let line = "5,9,,,,,,,,,,,,,,,0,,,,,,,,";
        let rec = parse_line(line).unwrap();
        assert_eq!(rec.frame, 5);
        assert_eq!(rec.x, None);
        assert_eq!(rec.dhw, None);
        assert_eq!(rec.lane_id, None);
        assert!(!rec.has_lead());
    }

    #[test]
    fn short_row_is_rejected() {
        let err = parse_line("1,2,3").unwrap_err();
        assert!(err.to_string().contains("expected 25 columns"));
    }

    #[test]
    fn missing_preceding_id_is_rejected() {
        let line = ROW.replace(",38.80,2,", ",38.80,,");
        let err = parse_line(&line).unwrap_err();
        assert!(err.to_string().contains("precedingId"));
    }

    #[test]
    fn bad_number_names_the_column() {
        let line = ROW.replace("25.38", "abc");
        let err = parse_line(&line).unwrap_err();
        assert!(format!("{err:#}").contains("dhw"));
    }

    #[test]
    fn stream_skips_header_and_collects_rejections() {
        let data = format!("{HEADER}\n{ROW}\n1,2,3\n\n{ROW}\n");
        let file = parse_tracks(Cursor::new(data), Path::new("01_tracks.csv")).unwrap();
        assert_eq!(file.records.len(), 2);
        assert_eq!(file.rejected.len(), 1);
        assert_eq!(file.rejected[0].0, 3);
    }

    #[test]
    fn invalid_utf8_line_is_rejected_not_fatal() {
        let mut data = Vec::new();
        data.extend_from_slice(HEADER.as_bytes());
        data.push(b'\n');
        data.extend_from_slice(ROW.as_bytes());
        data.extend_from_slice(b"\n1,2,\xff\xfe\n");
        data.extend_from_slice(ROW.as_bytes());
        data.push(b'\n');

        let file = parse_tracks(Cursor::new(data), Path::new("02_tracks.csv")).unwrap();
        assert_eq!(file.records.len(), 2);
        assert_eq!(file.rejected.len(), 1);
        assert_eq!(file.rejected[0].0, 3);
        assert!(file.rejected[0].1.contains("UTF-8"));
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let data = format!("{HEADER}\r\n{ROW}\r\n{ROW}\r\n");
        let file = parse_tracks(Cursor::new(data), Path::new("03_tracks.csv")).unwrap();
        assert_eq!(file.records.len(), 2);
        assert!(file.rejected.is_empty());
        assert_eq!(file.records[0].lane_id, Some(2));
    }

    #[test]
    fn directory_inputs_expand_to_track_files() {
        let dir = std::env::temp_dir().join(format!("highd-tracks-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["02_tracks.csv", "01_tracks.csv", "01_tracksMeta.csv"] {
            std::fs::write(dir.join(name), HEADER).unwrap();
        }
        let files = collect_track_files(&[dir.clone()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["01_tracks.csv", "02_tracks.csv"]);

        let parsed = read_tracks(&files[0]).unwrap();
        assert!(parsed.records.is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
