//! Density field storage and region views.
//!
//! The field owns a single `width x height` buffer of signed samples. A
//! [`Region`] is a descriptor (`offset`, `size`) naming one square window of
//! that buffer; regions never copy samples, they only address them.
//!
//! ## Sign convention
//!
//! Negative samples are solid, zero and positive samples are empty. Every
//! writer goes through [`SOLID`] and [`EMPTY`].

use strata_common::{RegionId, SampleCoord, TerrainError, TerrainResult};

/// Density value for solid terrain.
pub const SOLID: i8 = -1;

/// Density value for empty space.
pub const EMPTY: i8 = 1;

/// Returns true if a density sample counts as solid.
#[must_use]
pub const fn is_solid(value: i8) -> bool {
    value < 0
}

/// Scalar density grid partitioned into square regions.
#[derive(Debug, Clone)]
pub struct DensityField {
    width: u32,
    height: u32,
    region_size: u32,
    samples: Vec<i8>,
    /// Number of writes applied so far
    revision: u64,
    /// Revision observed by the last `take_changed`
    consumed: u64,
}

impl DensityField {
    /// Creates a field filled with `fill`.
    pub fn new(width: u32, height: u32, region_size: u32, fill: i8) -> TerrainResult<Self> {
        Self::validate_dimensions(width, height, region_size)?;
        Ok(Self {
            width,
            height,
            region_size,
            samples: vec![fill; width as usize * height as usize],
            revision: 0,
            consumed: 0,
        })
    }

    /// Creates a field from row-major samples.
    pub fn from_samples(
        width: u32,
        height: u32,
        region_size: u32,
        samples: Vec<i8>,
    ) -> TerrainResult<Self> {
        Self::validate_dimensions(width, height, region_size)?;
        if samples.len() != width as usize * height as usize {
            return Err(TerrainError::InvalidDimensions {
                width: width as usize,
                height: height as usize,
                region_size: region_size as usize,
            });
        }
        Ok(Self {
            width,
            height,
            region_size,
            samples,
            revision: 0,
            consumed: 0,
        })
    }

    /// Creates a field by evaluating `f(x, y)` for every sample.
    pub fn from_fn<F>(width: u32, height: u32, region_size: u32, mut f: F) -> TerrainResult<Self>
    where
        F: FnMut(u32, u32) -> i8,
    {
        Self::validate_dimensions(width, height, region_size)?;
        let mut samples = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self::from_samples(width, height, region_size, samples)
    }

    fn validate_dimensions(width: u32, height: u32, region_size: u32) -> TerrainResult<()> {
        if width == 0 || height == 0 || region_size == 0 || width % region_size != 0 || height % region_size != 0 {
            return Err(TerrainError::InvalidDimensions {
                width: width as usize,
                height: height as usize,
                region_size: region_size as usize,
            });
        }
        Ok(())
    }

    /// Field width in samples.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Field height in samples.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Region edge length in samples.
    #[must_use]
    pub const fn region_size(&self) -> u32 {
        self.region_size
    }

    /// Number of regions on the X axis.
    #[must_use]
    pub const fn region_count_x(&self) -> u32 {
        self.width / self.region_size
    }

    /// Number of regions on the Y axis.
    #[must_use]
    pub const fn region_count_y(&self) -> u32 {
        self.height / self.region_size
    }

    /// Returns the view of the region at grid position `(x, y)`.
    pub fn region(&self, x: u32, y: u32) -> TerrainResult<Region> {
        let regions_x = self.region_count_x();
        let regions_y = self.region_count_y();
        if x >= regions_x || y >= regions_y {
            return Err(TerrainError::RegionOutOfRange {
                x,
                y,
                regions_x,
                regions_y,
            });
        }
        Ok(Region {
            id: RegionId::new(x, y, regions_x),
            offset_x: x * self.region_size,
            offset_y: y * self.region_size,
            size: self.region_size,
        })
    }

    /// Iterates all region views in row-major order.
    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        let regions_x = self.region_count_x();
        (0..self.region_count_y()).flat_map(move |y| {
            (0..regions_x).map(move |x| Region {
                id: RegionId::new(x, y, regions_x),
                offset_x: x * self.region_size,
                offset_y: y * self.region_size,
                size: self.region_size,
            })
        })
    }

    /// Returns the sample at `(x, y)`, or `None` outside the field.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<i8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples.get(self.index(x, y)).copied()
    }

    /// Returns the sample at `(x, y)` with the coordinates clamped into the
    /// field. Extraction reads the far border of the last cell through this.
    #[must_use]
    pub fn sample_clamped(&self, x: i64, y: i64) -> i8 {
        let x = x.clamp(0, i64::from(self.width) - 1) as u32;
        let y = y.clamp(0, i64::from(self.height) - 1) as u32;
        self.samples[self.index(x, y)]
    }

    /// Raw row-major samples.
    #[must_use]
    pub fn samples(&self) -> &[i8] {
        &self.samples
    }

    /// Number of writes applied since creation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns true if any write happened since the previous call.
    pub fn take_changed(&mut self) -> bool {
        let changed = self.revision != self.consumed;
        self.consumed = self.revision;
        changed
    }

    #[inline]
    const fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    fn write(&mut self, x: u32, y: u32, value: i8) {
        let index = self.index(x, y);
        self.samples[index] = value;
        self.revision += 1;
    }
}

/// Square window into a [`DensityField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    id: RegionId,
    offset_x: u32,
    offset_y: u32,
    size: u32,
}

impl Region {
    /// Region identifier.
    #[must_use]
    pub const fn id(&self) -> RegionId {
        self.id
    }

    /// X offset of the window in field samples.
    #[must_use]
    pub const fn offset_x(&self) -> u32 {
        self.offset_x
    }

    /// Y offset of the window in field samples.
    #[must_use]
    pub const fn offset_y(&self) -> u32 {
        self.offset_y
    }

    /// Edge length of the window in samples.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Writes `value` at region-local `(x, y)`.
    ///
    /// Coordinates outside `[0, size)` are a caller bug and are rejected,
    /// never clamped.
    pub fn set_point(&self, field: &mut DensityField, x: i32, y: i32, value: i8) -> TerrainResult<()> {
        let local = self.check(x, y)?;
        field.write(self.offset_x + local.x as u32, self.offset_y + local.y as u32, value);
        Ok(())
    }

    /// Reads the sample at region-local `(x, y)`.
    pub fn get_point(&self, field: &DensityField, x: i32, y: i32) -> TerrainResult<i8> {
        let local = self.check(x, y)?;
        Ok(field.sample_clamped(
            i64::from(self.offset_x) + i64::from(local.x),
            i64::from(self.offset_y) + i64::from(local.y),
        ))
    }

    fn check(&self, x: i32, y: i32) -> TerrainResult<SampleCoord> {
        let local = SampleCoord::new(x, y);
        if local.is_within(self.size) {
            Ok(local)
        } else {
            Err(TerrainError::PointOutOfRange {
                x,
                y,
                size: self.size,
            })
        }
    }
}
