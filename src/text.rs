use std::fs;
use std::io;
use std::io::prelude::*;
use std::path;

fn invalid_data(line_number: usize, message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("line {line_number}: {message}"))
}

/// Read whitespace-separated m/z and intensity columns from a text file.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn arrays_from_file<P: AsRef<path::Path>>(path: P) -> io::Result<(Vec<f64>, Vec<f32>)> {
    let reader = io::BufReader::new(fs::File::open(path)?);
    let mut mz_array = Vec::new();
    let mut intensity_array = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let pref = line.trim();
        if pref.is_empty() || pref.starts_with('#') {
            continue;
        }
        let mut chunks = pref.split_whitespace();
        let (Some(mz), Some(intensity)) = (chunks.next(), chunks.next()) else {
            return Err(invalid_data(i + 1, "expected two columns".into()));
        };
        mz_array.push(
            mz.parse::<f64>()
                .map_err(|e| invalid_data(i + 1, format!("expected number for m/z: {e}")))?,
        );
        intensity_array.push(
            intensity
                .parse::<f32>()
                .map_err(|e| invalid_data(i + 1, format!("expected number for intensity: {e}")))?,
        );
    }
    Ok((mz_array, intensity_array))
}

pub fn to_file<P: AsRef<path::Path>>(mz_array: &[f64], intensity_array: &[f32], path: P) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    for (mz, intensity) in mz_array.iter().zip(intensity_array.iter()) {
        writer.write_all(format!("{}\t{}\n", mz, intensity).as_bytes())?;
    }
    writer.flush()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip_file() -> io::Result<()> {
        let path = std::env::temp_dir().join(format!("mzcwt-text-{}.txt", std::process::id()));
        let mz = [100.0, 100.5, 101.25];
        let intensity = [0.0f32, 12.5, 3.0];
        to_file(&mz, &intensity, &path)?;
        let (mz2, intensity2) = arrays_from_file(&path)?;
        fs::remove_file(&path)?;
        assert_eq!(mz2, mz);
        assert_eq!(intensity2, intensity);
        Ok(())
    }

    #[test]
    fn test_malformed_line() -> io::Result<()> {
        let path = std::env::temp_dir().join(format!("mzcwt-bad-{}.txt", std::process::id()));
        fs::write(&path, "# comment\n100.0\t5\n\n101.0 abc\n")?;
        let err = arrays_from_file(&path).unwrap_err();
        fs::remove_file(&path)?;
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("line 4"));
        Ok(())
    }
}
