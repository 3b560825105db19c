//! Sets constants for the candidate file layout
//!
//! A file is an `i64` record count followed by fixed-size records. All integers are
//! little-endian.


//for whole file
pub const HEADER_COUNT_START: usize = 0;
pub const HEADER_COUNT_SIZE: usize = 8;

pub const FILE_DATA_START: usize = HEADER_COUNT_START + HEADER_COUNT_SIZE;

//for a single candidate record
pub const LABEL_ONE_START: usize = 0;
pub const LABEL_ONE_SIZE: usize = 8;

pub const LABEL_TWO_START: usize = LABEL_ONE_START + LABEL_ONE_SIZE;
pub const LABEL_TWO_SIZE: usize = 8;

pub const Z_START: usize = LABEL_TWO_START + LABEL_TWO_SIZE;
pub const Z_SIZE: usize = 8;

pub const Y_START: usize = Z_START + Z_SIZE;
pub const Y_SIZE: usize = 8;

pub const X_START: usize = Y_START + Y_SIZE;
pub const X_SIZE: usize = 8;

pub const GROUND_TRUTH_OFFSET: usize = X_START + X_SIZE;
pub const GROUND_TRUTH_SIZE: usize = 1;

pub const RECORD_SIZE: usize = GROUND_TRUTH_OFFSET + GROUND_TRUTH_SIZE;

/// Stored flag for records of the undetermined bucket. Carries no true/false meaning.
pub const UNDETERMINED_PLACEHOLDER: u8 = 1;

pub fn calc_offset(index: usize) -> usize {

    return FILE_DATA_START + (index * RECORD_SIZE);
}

/// Expected size in bytes of a file holding `count` records.
pub fn file_size(count: usize) -> usize {

    return calc_offset(count);
}
