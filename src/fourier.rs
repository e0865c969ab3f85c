//! Loader for tabulated BSDFs stored in the binary `SCATFUN` format
//!
//! The table stores, for pairs of discretized incident and exitant elevation cosines, a Fourier
//! series in the azimuthal difference. This module only reads, validates and writes the data,
//! interpolating and sampling the series is left to the renderer.
//!
//! # Layout
//! All numbers are little endian, integers are `i32` and floats are `f32`.
//!
//! | bytes | content |
//! |---|---|
//! | 7 | ascii `SCATFUN` |
//! | 1 | version, must be `1` |
//! | 4 | flags, must be `1` |
//! | 4 × 5 | `n_mu`, `n_coeffs`, `m_max`, `n_channels` (1 or 3), `n_bases` (must be 1) |
//! | 4 × 3 | unused |
//! | 4 | `eta` |
//! | 4 × 4 | unused |
//! | 4 × `n_mu` | `mu` |
//! | 4 × `n_mu²` | `cdf` |
//! | 4 × 2 × `n_mu²` | coefficient offset and order per entry |
//! | 4 × `n_coeffs` | coefficients |
//!
//! **Note: This code is only available with the `fourier` feature**

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

const MAGIC: &[u8; 7] = b"SCATFUN";
const VERSION: u8 = 1;
const FLAGS: i32 = 1;

/// Everything that can go wrong while loading a [`FourierTable`]
#[derive(Debug, thiserror::Error)]
pub enum FourierTableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("not a SCATFUN file")]
    BadMagic,

    #[error("unsupported SCATFUN version {0}")]
    UnsupportedVersion(u8),

    #[error("unsupported flags {0:#x}")]
    UnsupportedFlags(i32),

    #[error("unsupported number of color channels: {0}, expected 1 or 3")]
    UnsupportedChannels(i32),

    #[error("unsupported number of bases: {0}, expected 1")]
    UnsupportedBases(i32),

    #[error("invalid table dimensions: {0}")]
    InvalidDimensions(&'static str),

    #[error("file ends before the table does")]
    Truncated,
}

fn eof_as_truncated(err: io::Error) -> FourierTableError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        FourierTableError::Truncated
    } else {
        FourierTableError::Io(err)
    }
}

fn count(value: i32, what: &'static str) -> Result<usize, FourierTableError> {
    usize::try_from(value).map_err(|_| FourierTableError::InvalidDimensions(what))
}

fn read_f32s<R: Read>(reader: &mut R, len: usize) -> Result<Vec<f32>, FourierTableError> {
    let mut values = vec![0.0; len];
    reader
        .read_f32_into::<LittleEndian>(&mut values)
        .map_err(eof_as_truncated)?;
    Ok(values)
}

fn read_i32s<R: Read>(reader: &mut R, len: usize) -> Result<Vec<i32>, FourierTableError> {
    let mut values = vec![0; len];
    reader
        .read_i32_into::<LittleEndian>(&mut values)
        .map_err(eof_as_truncated)?;
    Ok(values)
}

/// A tabulated BSDF in Fourier representation
///
/// Entries are addressed by a pair of indices into [`FourierTable::mu`], the incident one first.
#[derive(Clone, Debug, PartialEq)]
pub struct FourierTable {
    eta: f32,
    m_max: usize,
    n_channels: usize,
    n_mu: usize,
    mu: Vec<f32>,
    cdf: Vec<f32>,
    a0: Vec<f32>,
    a_offset: Vec<usize>,
    m: Vec<usize>,
    a: Vec<f32>,
    recip: Vec<f32>,
}

impl FourierTable {
    /// Builds a table from its raw parts. `a_offset` and `m` hold one entry per pair of `mu`
    /// values, `cdf` as well.
    ///
    /// # Errors
    /// Fails if the channel count is not 1 or 3, or if the sizes of the parts do not fit
    /// together.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        eta: f32,
        m_max: usize,
        n_channels: usize,
        mu: Vec<f32>,
        cdf: Vec<f32>,
        a_offset: Vec<usize>,
        m: Vec<usize>,
        a: Vec<f32>,
    ) -> Result<Self, FourierTableError> {
        if n_channels != 1 && n_channels != 3 {
            return Err(FourierTableError::UnsupportedChannels(
                i32::try_from(n_channels).unwrap_or(i32::MAX),
            ));
        }
        let n_mu = mu.len();
        let n_entries = n_mu
            .checked_mul(n_mu)
            .ok_or(FourierTableError::InvalidDimensions("too many mu values"))?;
        if cdf.len() != n_entries {
            return Err(FourierTableError::InvalidDimensions("cdf size"));
        }
        if a_offset.len() != n_entries || m.len() != n_entries {
            return Err(FourierTableError::InvalidDimensions("coefficient index size"));
        }
        for (&offset, &order) in a_offset.iter().zip(&m) {
            if order > m_max {
                return Err(FourierTableError::InvalidDimensions("order exceeds m_max"));
            }
            let end = order
                .checked_mul(n_channels)
                .and_then(|len| len.checked_add(offset));
            if end.map_or(true, |end| end > a.len()) {
                return Err(FourierTableError::InvalidDimensions(
                    "coefficients out of bounds",
                ));
            }
        }

        // the constant terms of the luminance channel, for quick lookups
        let a0 = a_offset
            .iter()
            .zip(&m)
            .map(|(&offset, &order)| if order > 0 { a[offset] } else { 0.0 })
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let recip = (0..m_max).map(|i| 1.0 / i as f32).collect();

        Ok(Self {
            eta,
            m_max,
            n_channels,
            n_mu,
            mu,
            cdf,
            a0,
            a_offset,
            m,
            a,
            recip,
        })
    }

    /// Opens and reads the file at `path`
    ///
    /// # Errors
    /// See [`FourierTable::read`]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FourierTableError> {
        let path = path.as_ref();
        let table = Self::read(BufReader::new(File::open(path)?));
        if let Ok(table) = &table {
            log::debug!(
                "loaded fourier table {}: {} mu values, {} channels, m_max {}",
                path.display(),
                table.n_mu,
                table.n_channels,
                table.m_max
            );
        }
        table
    }

    /// Parses a table. Nothing past the coefficient pool is consumed.
    ///
    /// # Errors
    /// [`FourierTableError::Io`] if the reader fails, any other variant if the content is not a
    /// supported table.
    pub fn read<R: Read>(mut reader: R) -> Result<Self, FourierTableError> {
        Self::read_unlogged(&mut reader).map_err(|err| {
            log::warn!("rejected fourier table: {err}");
            err
        })
    }

    fn read_unlogged<R: Read>(reader: &mut R) -> Result<Self, FourierTableError> {
        let mut magic = [0_u8; 7];
        reader.read_exact(&mut magic).map_err(eof_as_truncated)?;
        if &magic != MAGIC {
            return Err(FourierTableError::BadMagic);
        }
        let version = reader.read_u8().map_err(eof_as_truncated)?;
        if version != VERSION {
            return Err(FourierTableError::UnsupportedVersion(version));
        }

        // flags, n_mu, n_coeffs, m_max, n_channels, n_bases and three unused
        let header = read_i32s(reader, 9)?;
        let [flags, n_mu, n_coeffs, m_max, n_channels, n_bases, ..] = header[..] else {
            return Err(FourierTableError::Truncated);
        };
        if flags != FLAGS {
            return Err(FourierTableError::UnsupportedFlags(flags));
        }
        if n_channels != 1 && n_channels != 3 {
            return Err(FourierTableError::UnsupportedChannels(n_channels));
        }
        if n_bases != 1 {
            return Err(FourierTableError::UnsupportedBases(n_bases));
        }
        let eta = reader.read_f32::<LittleEndian>().map_err(eof_as_truncated)?;
        read_i32s(reader, 4)?;

        let n_mu = count(n_mu, "negative n_mu")?;
        let n_coeffs = count(n_coeffs, "negative n_coeffs")?;
        let m_max = count(m_max, "negative m_max")?;
        let n_entries = n_mu
            .checked_mul(n_mu)
            .ok_or(FourierTableError::InvalidDimensions("too many mu values"))?;

        let mu = read_f32s(reader, n_mu)?;
        let cdf = read_f32s(reader, n_entries)?;
        let offset_and_length = read_i32s(reader, 2 * n_entries)?;
        let a = read_f32s(reader, n_coeffs)?;

        let mut a_offset = Vec::with_capacity(n_entries);
        let mut m = Vec::with_capacity(n_entries);
        for pair in offset_and_length.chunks_exact(2) {
            a_offset.push(count(pair[0], "negative coefficient offset")?);
            m.push(count(pair[1], "negative coefficient count")?);
        }

        Self::new(
            eta,
            m_max,
            usize::try_from(n_channels).unwrap_or(1),
            mu,
            cdf,
            a_offset,
            m,
            a,
        )
    }

    /// Serializes the table in the layout [`FourierTable::read`] expects
    ///
    /// # Errors
    /// Fails if the writer fails or a dimension does not fit an `i32`.
    pub fn write<W: Write>(&self, writer: W) -> Result<(), FourierTableError> {
        let mut writer = BufWriter::new(writer);
        let int = |value: usize| {
            i32::try_from(value).map_err(|_| {
                FourierTableError::InvalidDimensions("dimension does not fit the format")
            })
        };

        writer.write_all(MAGIC)?;
        writer.write_u8(VERSION)?;
        for value in [
            FLAGS,
            int(self.n_mu)?,
            int(self.a.len())?,
            int(self.m_max)?,
            int(self.n_channels)?,
            1,
            0,
            0,
            0,
        ] {
            writer.write_i32::<LittleEndian>(value)?;
        }
        writer.write_f32::<LittleEndian>(self.eta)?;
        for _ in 0..4 {
            writer.write_i32::<LittleEndian>(0)?;
        }

        for &value in self.mu.iter().chain(&self.cdf) {
            writer.write_f32::<LittleEndian>(value)?;
        }
        for (&offset, &order) in self.a_offset.iter().zip(&self.m) {
            writer.write_i32::<LittleEndian>(int(offset)?)?;
            writer.write_i32::<LittleEndian>(int(order)?)?;
        }
        for &value in &self.a {
            writer.write_f32::<LittleEndian>(value)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Relative index of refraction at the interface, `1` if the table only reflects
    #[must_use]
    pub const fn eta(&self) -> f32 {
        self.eta
    }

    /// Highest number of Fourier terms of any entry
    #[must_use]
    pub const fn m_max(&self) -> usize {
        self.m_max
    }

    #[must_use]
    pub const fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Discretized elevation cosines, sorted ascending
    #[must_use]
    pub fn mu(&self) -> &[f32] {
        &self.mu
    }

    #[must_use]
    pub fn cdf(&self) -> &[f32] {
        &self.cdf
    }

    /// Constant Fourier term of every entry, zero where an entry has no terms
    #[must_use]
    pub fn a0(&self) -> &[f32] {
        &self.a0
    }

    /// `1 / i` for every order `i < m_max`, infinite for `i = 0`
    #[must_use]
    pub fn recip(&self) -> &[f32] {
        &self.recip
    }

    fn entry(&self, offset_i: usize, offset_o: usize) -> usize {
        assert!(
            offset_i < self.n_mu && offset_o < self.n_mu,
            "mu index out of range"
        );
        offset_o * self.n_mu + offset_i
    }

    /// Number of Fourier terms per channel stored for the pair of `mu` indices
    #[must_use]
    pub fn order(&self, offset_i: usize, offset_o: usize) -> usize {
        self.m[self.entry(offset_i, offset_o)]
    }

    /// The Fourier terms of all channels for the pair of `mu` indices, channel after channel
    #[must_use]
    pub fn coefficients(&self, offset_i: usize, offset_o: usize) -> &[f32] {
        let entry = self.entry(offset_i, offset_o);
        let start = self.a_offset[entry];
        &self.a[start..start + self.m[entry] * self.n_channels]
    }

    /// Index of the interval `mu[i]..=mu[i + 1]` that contains `cos_theta`, `None` outside of
    /// the tabulated range
    #[must_use]
    pub fn find_mu(&self, cos_theta: f64) -> Option<usize> {
        let (&first, &last) = (self.mu.first()?, self.mu.last()?);
        if self.n_mu < 2 || cos_theta < f64::from(first) || cos_theta > f64::from(last) {
            return None;
        }
        let above = self.mu.partition_point(|&mu| f64::from(mu) <= cos_theta);
        Some((above - 1).min(self.n_mu - 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_SIZE: usize = 64;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Two mu values and a coefficient pool shared by the entries
    fn synthetic(n_channels: usize) -> FourierTable {
        let m = vec![2, 1, 0, 2];
        let a_offset = vec![0, 2 * n_channels, 0, 3 * n_channels];
        let a = (0..5 * n_channels).map(|i| 0.5 + i as f32).collect();
        FourierTable::new(
            1.5,
            2,
            n_channels,
            vec![-1.0, 1.0],
            vec![0.0, 0.25, 0.5, 1.0],
            a_offset,
            m,
            a,
        )
        .unwrap()
    }

    fn to_bytes(table: &FourierTable) -> Vec<u8> {
        let mut bytes = Vec::new();
        table.write(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn round_trip() {
        init_logger();
        for n_channels in [1, 3] {
            let table = synthetic(n_channels);
            let bytes = to_bytes(&table);
            assert_eq!(&bytes[..8], b"SCATFUN\x01");
            assert_eq!(bytes.len(), HEADER_SIZE + 4 * (2 + 4 + 8 + 5 * n_channels));

            let read = FourierTable::read(bytes.as_slice()).unwrap();
            assert_eq!(read, table);
        }
    }

    #[test]
    fn derived_values() {
        let table = synthetic(3);
        assert_eq!(table.a0(), &[0.5, 6.5, 0.0, 9.5]);
        assert_eq!(table.recip().len(), 2);
        assert!(table.recip()[0].is_infinite());
        assert_eq!(table.recip()[1], 1.0);

        assert_eq!(table.order(0, 0), 2);
        assert_eq!(table.order(1, 0), 1);
        assert_eq!(table.coefficients(1, 0), &[6.5, 7.5, 8.5]);
        assert!(table.coefficients(0, 1).is_empty());
        assert_eq!(table.coefficients(1, 1).len(), 6);
    }

    #[test]
    fn find_mu() {
        let table = FourierTable::new(
            1.0,
            1,
            1,
            vec![-1.0, 0.0, 0.5, 1.0],
            vec![0.0; 16],
            vec![0; 16],
            vec![1; 16],
            vec![1.0],
        )
        .unwrap();
        assert_eq!(table.find_mu(-1.0), Some(0));
        assert_eq!(table.find_mu(-0.3), Some(0));
        assert_eq!(table.find_mu(0.0), Some(1));
        assert_eq!(table.find_mu(0.7), Some(2));
        assert_eq!(table.find_mu(1.0), Some(2));
        assert_eq!(table.find_mu(1.1), None);
        assert_eq!(table.find_mu(-1.1), None);
    }

    #[test]
    fn corrupted_header_is_rejected() {
        init_logger();
        let bytes = to_bytes(&synthetic(1));

        // magic, version, flags, n_channels and n_bases are validated
        let validated = (0..12).chain(24..32);
        for index in validated {
            let mut corrupted = bytes.clone();
            corrupted[index] ^= 0xff;
            let result = FourierTable::read(corrupted.as_slice());
            assert!(result.is_err(), "byte {index} was not validated");
        }

        let mut corrupted = bytes.clone();
        corrupted[0] = b's';
        assert!(matches!(
            FourierTable::read(corrupted.as_slice()),
            Err(FourierTableError::BadMagic)
        ));
        let mut corrupted = bytes.clone();
        corrupted[7] = 2;
        assert!(matches!(
            FourierTable::read(corrupted.as_slice()),
            Err(FourierTableError::UnsupportedVersion(2))
        ));
        let mut corrupted = bytes.clone();
        corrupted[24] = 2;
        assert!(matches!(
            FourierTable::read(corrupted.as_slice()),
            Err(FourierTableError::UnsupportedChannels(2))
        ));
        let mut corrupted = bytes;
        corrupted[28] = 3;
        assert!(matches!(
            FourierTable::read(corrupted.as_slice()),
            Err(FourierTableError::UnsupportedBases(3))
        ));
    }

    #[test]
    fn rejects_inconsistent_content() {
        let bytes = to_bytes(&synthetic(1));
        assert!(matches!(
            FourierTable::read(&bytes[..bytes.len() - 1]),
            Err(FourierTableError::Truncated)
        ));
        assert!(matches!(
            FourierTable::read(&bytes[..5]),
            Err(FourierTableError::Truncated)
        ));

        // m_max below the order of the first entry
        let mut corrupted = bytes.clone();
        corrupted[20] = 1;
        assert!(matches!(
            FourierTable::read(corrupted.as_slice()),
            Err(FourierTableError::InvalidDimensions(_))
        ));

        // negative n_mu
        let mut corrupted = bytes;
        corrupted[15] = 0x80;
        assert!(matches!(
            FourierTable::read(corrupted.as_slice()),
            Err(FourierTableError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn open_from_disk() {
        init_logger();
        let table = synthetic(3);
        let path = std::env::temp_dir().join(format!("bxdf-fourier-{}.bsdf", std::process::id()));
        table.write(File::create(&path).unwrap()).unwrap();
        let read = FourierTable::open(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read.unwrap(), table);

        assert!(matches!(
            FourierTable::open(path.with_extension("missing")),
            Err(FourierTableError::Io(_))
        ));
    }
}
