//! Handles read and write of whole candidate files
//!
//! A file holds one bucket. The ground truth flag stored per record is only meaningful for the
//! positive and negative buckets; the file name carries the bucket.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use tempfile::{Builder, NamedTempFile};

use crate::candidate::{Candidate, CandidateSet};
use crate::data::GroundTruth;
use crate::error::{Error, Result};
use crate::layout;

pub const CANDIDATE_EXTENSION: &str = "candidates";

/// `<prefix>-<maximum_distance>nm-<bucket>.candidates`
pub fn candidate_filename(prefix: &str, maximum_distance: f64, bucket: GroundTruth) -> String {

    return format!("{}-{}nm-{}.{}", prefix, maximum_distance, bucket.bucket_name(), CANDIDATE_EXTENSION);
}

/// Shuffles `candidates` with `rng` and writes them to `path`, replacing any existing file.
pub fn save_candidates<R: Rng + ?Sized>(path: &Path, candidates: &mut [Candidate], rng: &mut R) -> Result<()> {

    let fd = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .map_err(|e| Error::io(path, e))?;

    write_candidates(fd, path, candidates, rng)?;

    debug!("wrote {} candidates to {:?}", candidates.len(), path);

    Ok(())
}

fn write_candidates<W: Write, R: Rng + ?Sized>(writer: W, path: &Path, candidates: &mut [Candidate], rng: &mut R) -> Result<()> {

    candidates.shuffle(rng);

    let mut writer = BufWriter::new(writer);

    let count = i64::try_from(candidates.len()).map_err(|_| Error::ValueOverflow(candidates.len() as u64))?;
    let mut count_arr: [u8; layout::HEADER_COUNT_SIZE] = [0x00; layout::HEADER_COUNT_SIZE];
    LittleEndian::write_i64(&mut count_arr, count);

    writer.write_all(&count_arr).map_err(|e| Error::io(path, e))?;

    //add every candidate to the binary file
    for candidate in candidates.iter() {
        let arr = candidate.to_arr()?;
        writer.write_all(&arr).map_err(|e| Error::io(path, e))?;
    }

    writer.flush().map_err(|e| Error::io(path, e))?;

    Ok(())
}

/// Reads a file written by [`save_candidates`]. `bucket` is the bucket the file was written
/// for; it decides how the stored ground truth flag is interpreted.
pub fn read_candidates(path: &Path, bucket: GroundTruth) -> Result<Vec<Candidate>> {

    let data = fs::read(path).map_err(|e| Error::io(path, e))?;

    if data.len() < layout::FILE_DATA_START {
        return Err(Error::corrupt(path, format!("file has {} bytes, shorter than the header", data.len())));
    }

    let count = LittleEndian::read_i64(&data[layout::HEADER_COUNT_START..layout::HEADER_COUNT_START + layout::HEADER_COUNT_SIZE]);

    let count = match usize::try_from(count) {
        Ok(count) => count,
        Err(_) => return Err(Error::corrupt(path, format!("negative record count {}", count))),
    };

    let expected = count.checked_mul(layout::RECORD_SIZE).and_then(|n| n.checked_add(layout::FILE_DATA_START));
    if expected != Some(data.len()) {
        return Err(Error::corrupt(path, format!("{} records need {} bytes, file has {}",
            count, layout::file_size(count), data.len())));
    }

    let mut candidates: Vec<Candidate> = Vec::with_capacity(count);

    for i in 0..count {
        let start = layout::calc_offset(i);
        let candidate = Candidate::from_slice(&data[start..start + layout::RECORD_SIZE], bucket)
            .map_err(|reason| Error::corrupt(path, format!("record {}: {}", i, reason)))?;
        candidates.push(candidate);
    }

    Ok(candidates)
}

/// Writes the three buckets of `set` into `directory` as a group.
///
/// Each bucket goes to a temporary file first; the files are only moved to their final names
/// once all three were written. On error the temporaries are removed and nothing is replaced.
pub fn save_candidate_set<R: Rng + ?Sized>(
    directory: &Path,
    prefix: &str,
    maximum_distance: f64,
    set: &mut CandidateSet,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {

    fs::create_dir_all(directory).map_err(|e| Error::io(directory, e))?;

    let mut pending: Vec<(NamedTempFile, PathBuf)> = Vec::with_capacity(GroundTruth::ALL.len());

    for bucket in GroundTruth::ALL {

        let output_path = directory.join(candidate_filename(prefix, maximum_distance, bucket));

        let temp_prefix = format!(".{}-", bucket.bucket_name());
        let mut builder = Builder::new();
        builder.prefix(&temp_prefix).suffix(".tmp");

        //temporaries default to owner-only; persisted files get the mode a plain create gives
        #[cfg(unix)]
        builder.permissions(fs::Permissions::from_mode(0o666));

        let temp_file = builder.tempfile_in(directory).map_err(|e| Error::io(directory, e))?;

        let candidates = set.bucket_mut(bucket);
        let fd: &File = temp_file.as_file();
        write_candidates(fd, temp_file.path(), candidates, rng)?;
        fd.sync_all().map_err(|e| Error::io(temp_file.path(), e))?;

        pending.push((temp_file, output_path));
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(pending.len());

    for (temp_file, output_path) in pending.into_iter() {
        temp_file.persist(&output_path).map_err(|e| Error::io(&output_path, e.error))?;
        info!("saved {}", output_path.display());
        written.push(output_path);
    }

    Ok(written)
}
