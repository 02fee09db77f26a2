use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use twoview_linalg::Point2d;

use super::TableError;
use crate::three_view::Triplets;
use crate::types::{Correspondence, CorrespondenceSet, ImagePair};

/// Header of the flat correspondence table.
pub const CORRESPONDENCE_HEADER: &str = "pair_id,index,xa,ya,xb,yb";

/// Header of the three-view triplet table.
pub const TRIPLET_HEADER: &str = "ImageA_x,ImageA_y,ImageB_x,ImageB_y,ImageC_x,ImageC_y";

fn parse_part<T: std::str::FromStr>(s: &str, line: usize) -> Result<T, TableError>
where
    T::Err: std::fmt::Display,
{
    s.trim().parse::<T>().map_err(|e| TableError::ParseError {
        line,
        message: format!("{}: {}", s, e),
    })
}

fn split_fields(text: &str, expected: usize, line: usize) -> Result<Vec<&str>, TableError> {
    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != expected {
        return Err(TableError::ParseError {
            line,
            message: format!("expected {} fields, found {}", expected, fields.len()),
        });
    }
    Ok(fields)
}

/// Read the header and the non-empty data lines, numbered from one.
fn read_rows(
    path: impl AsRef<Path>,
    header: &'static str,
) -> Result<Vec<(usize, String)>, TableError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let first = lines.next().transpose()?.unwrap_or_default();
    if first.trim() != header {
        return Err(TableError::InvalidHeader {
            expected: header,
            found: first,
        });
    }

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        if !line.trim().is_empty() {
            rows.push((i + 2, line));
        }
    }
    Ok(rows)
}

fn parse_pair_id(s: &str, line: usize) -> Result<ImagePair, TableError> {
    match s.trim().split_once('|') {
        Some((a, b)) if !a.is_empty() && !b.is_empty() && !b.contains('|') => {
            Ok(ImagePair::new(a, b))
        }
        _ => Err(TableError::ParseError {
            line,
            message: format!("invalid pair id {:?}, expected imageA|imageB", s),
        }),
    }
}

/// Read a flat correspondence table into one set per image pair.
///
/// Pairs are returned in order of first appearance. The rows of a pair may be
/// in any order but their indices must cover `0..n` exactly once.
///
/// # Arguments
///
/// * `path` - The path to the CSV file with header `pair_id,index,xa,ya,xb,yb`.
pub fn read_correspondence_table(
    path: impl AsRef<Path>,
) -> Result<Vec<CorrespondenceSet>, TableError> {
    let mut order: Vec<ImagePair> = Vec::new();
    let mut rows: HashMap<ImagePair, Vec<(usize, usize, Correspondence)>> = HashMap::new();

    for (line, text) in read_rows(path, CORRESPONDENCE_HEADER)? {
        let fields = split_fields(&text, 6, line)?;
        let pair = parse_pair_id(fields[0], line)?;
        let index: usize = parse_part(fields[1], line)?;
        let c = Correspondence::new(
            Point2d::new(parse_part(fields[2], line)?, parse_part(fields[3], line)?),
            Point2d::new(parse_part(fields[4], line)?, parse_part(fields[5], line)?),
        );
        if !rows.contains_key(&pair) {
            order.push(pair.clone());
        }
        rows.entry(pair).or_default().push((index, line, c));
    }

    order
        .into_iter()
        .map(|pair| {
            let mut entries = rows.remove(&pair).unwrap_or_default();
            entries.sort_by_key(|(index, _, _)| *index);
            for (expected, (index, line, _)) in entries.iter().enumerate() {
                if *index != expected {
                    return Err(TableError::ParseError {
                        line: *line,
                        message: format!(
                            "pair {} has index {} where {} was expected",
                            pair, index, expected
                        ),
                    });
                }
            }
            let correspondences = entries.into_iter().map(|(_, _, c)| c).collect();
            Ok(CorrespondenceSet::new(pair, correspondences))
        })
        .collect()
}

/// Write correspondence sets as a flat correspondence table.
///
/// Image names that are empty or contain `,` or `|` cannot be read back and
/// are rejected before the file is created.
pub fn write_correspondence_table(
    path: impl AsRef<Path>,
    sets: &[CorrespondenceSet],
) -> Result<(), TableError> {
    // names must survive the `imageA|imageB` pair id, checked before touching the file
    let mut line = 2;
    for set in sets {
        let pair = set.pair();
        for name in [&pair.a, &pair.b] {
            if name.is_empty() || name.contains([',', '|']) {
                return Err(TableError::ParseError {
                    line,
                    message: format!("image name {:?} cannot be written in a pair id", name),
                });
            }
        }
        line += set.len();
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", CORRESPONDENCE_HEADER)?;
    for set in sets {
        for (i, c) in set.iter().enumerate() {
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                set.pair(),
                i,
                c.a.x,
                c.a.y,
                c.b.x,
                c.b.y
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Read a triplet table of points matched over images A, B and C.
///
/// # Arguments
///
/// * `path` - The path to the CSV file with header
///   `ImageA_x,ImageA_y,ImageB_x,ImageB_y,ImageC_x,ImageC_y`.
pub fn read_triplet_table(path: impl AsRef<Path>) -> Result<Triplets, TableError> {
    let mut a = Vec::new();
    let mut b = Vec::new();
    let mut c = Vec::new();
    for (line, text) in read_rows(path, TRIPLET_HEADER)? {
        let fields = split_fields(&text, 6, line)?;
        let v = fields
            .iter()
            .map(|f| parse_part::<f64>(f, line))
            .collect::<Result<Vec<_>, _>>()?;
        a.push(Point2d::new(v[0], v[1]));
        b.push(Point2d::new(v[2], v[3]));
        c.push(Point2d::new(v[4], v[5]));
    }
    Ok(Triplets::new(a, b, c)?)
}

/// Write point triplets as a triplet table.
pub fn write_triplet_table(path: impl AsRef<Path>, triplets: &Triplets) -> Result<(), TableError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", TRIPLET_HEADER)?;
    for ((a, b), c) in triplets
        .a()
        .iter()
        .zip(triplets.b().iter())
        .zip(triplets.c().iter())
    {
        writeln!(writer, "{},{},{},{},{},{}", a.x, a.y, b.x, b.y, c.x, c.y)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_text(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_read_correspondence_table_unsorted() -> Result<(), TableError> {
        let dir = tempfile::tempdir()?;
        let path = write_text(
            &dir,
            "matches.csv",
            "pair_id,index,xa,ya,xb,yb\n\
             left|right,1,10.5,20,11.5,21\n\
             top|bottom,0,1,2,3,4\n\
             left|right,0,0,0,1,1\n\
             \n",
        );
        let sets = read_correspondence_table(&path)?;
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].pair(), &ImagePair::new("left", "right"));
        assert_eq!(sets[0].len(), 2);
        assert_eq!(sets[0].as_slice()[0].b, Point2d::new(1.0, 1.0));
        assert_eq!(sets[0].as_slice()[1].a, Point2d::new(10.5, 20.0));
        assert_eq!(sets[1].pair(), &ImagePair::new("top", "bottom"));
        Ok(())
    }

    #[test]
    fn test_read_correspondence_table_errors() -> Result<(), TableError> {
        let dir = tempfile::tempdir()?;

        let path = write_text(&dir, "header.csv", "a,b,c\n");
        assert!(matches!(
            read_correspondence_table(&path),
            Err(TableError::InvalidHeader { .. })
        ));

        let path = write_text(
            &dir,
            "gap.csv",
            "pair_id,index,xa,ya,xb,yb\nl|r,0,0,0,0,0\nl|r,2,0,0,0,0\n",
        );
        assert!(matches!(
            read_correspondence_table(&path),
            Err(TableError::ParseError { line: 3, .. })
        ));

        let path = write_text(
            &dir,
            "number.csv",
            "pair_id,index,xa,ya,xb,yb\nl|r,0,zero,0,0,0\n",
        );
        assert!(matches!(
            read_correspondence_table(&path),
            Err(TableError::ParseError { line: 2, .. })
        ));

        let path = write_text(&dir, "pair.csv", "pair_id,index,xa,ya,xb,yb\nlr,0,0,0,0,0\n");
        assert!(matches!(
            read_correspondence_table(&path),
            Err(TableError::ParseError { line: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_correspondence_table_write_read() -> Result<(), TableError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.csv");
        let set = CorrespondenceSet::from_points(
            ImagePair::new("img0.png", "img1.png"),
            &[Point2d::new(0.25, -3.0), Point2d::new(100.0, 7.125)],
            &[Point2d::new(1.0, 2.0), Point2d::new(-5.5, 0.0)],
        )?;
        write_correspondence_table(&path, std::slice::from_ref(&set))?;
        assert_eq!(read_correspondence_table(&path)?, vec![set]);
        Ok(())
    }

    #[test]
    fn test_write_correspondence_table_rejects_separators() -> Result<(), TableError> {
        let dir = tempfile::tempdir()?;
        let ok = CorrespondenceSet::from_points(
            ImagePair::new("left", "right"),
            &[Point2d::new(0.0, 0.0)],
            &[Point2d::new(1.0, 1.0)],
        )?;
        for (a, b) in [("a,b", "c"), ("a|x", "c"), ("a", "")] {
            let path = dir.path().join("names.csv");
            let set = CorrespondenceSet::from_points(
                ImagePair::new(a, b),
                &[Point2d::new(0.0, 0.0)],
                &[Point2d::new(1.0, 1.0)],
            )?;
            assert!(matches!(
                write_correspondence_table(&path, &[ok.clone(), set]),
                Err(TableError::ParseError { line: 3, .. })
            ));
            assert!(!path.exists());
        }
        Ok(())
    }

    #[test]
    fn test_triplet_table() -> Result<(), TableError> {
        let dir = tempfile::tempdir()?;
        let path = write_text(
            &dir,
            "triplets.csv",
            "ImageA_x,ImageA_y,ImageB_x,ImageB_y,ImageC_x,ImageC_y\n\
             1,2,3,4,5,6\n\
             7,8,9,10,11,12\n",
        );
        let triplets = read_triplet_table(&path)?;
        assert_eq!(triplets.len(), 2);
        assert_eq!(triplets.c()[1], Point2d::new(11.0, 12.0));

        let out = dir.path().join("copy.csv");
        write_triplet_table(&out, &triplets)?;
        assert_eq!(read_triplet_table(&out)?, triplets);

        let bad = write_text(
            &dir,
            "short.csv",
            "ImageA_x,ImageA_y,ImageB_x,ImageB_y,ImageC_x,ImageC_y\n1,2,3\n",
        );
        assert!(matches!(
            read_triplet_table(&bad),
            Err(TableError::ParseError { line: 2, .. })
        ));
        Ok(())
    }
}
