//! Synthetic GRIB2 writer.
//!
//! Produces small but structurally valid GRIB2 messages (simple packing,
//! template 5.0) shaped like HRRR output. Several messages can be joined
//! into one file with [`build_file`], which is how a real HRRR file with
//! many variables and levels looks to the decoder.

/// Grid definition template written into Section 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridTemplate {
    /// Template 3.0: regular latitude/longitude
    LatLon,
    /// Template 3.30: Lambert conformal, as used by HRRR CONUS
    LambertConformal,
}

/// Build a minimal GRIB2 message with the specified parameters
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    template: GridTemplate,
    ni: u32, // columns
    nj: u32, // rows
    scanning_mode: u8,
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: u32,
    forecast_hour: u32,
    data_values: Vec<f32>,
}

impl Grib2Builder {
    /// A small HRRR-like message: Lambert conformal, rows scanned south to
    /// north, CAPE at the surface with a constant value.
    pub fn new_hrrr() -> Self {
        let ni = 8;
        let nj = 6;
        Self {
            discipline: 0, // Meteorological
            center: 7,     // NCEP
            year: 2024,
            month: 6,
            day: 15,
            hour: 12,
            template: GridTemplate::LambertConformal,
            ni,
            nj,
            scanning_mode: 0b0100_0000, // +i, +j, i consecutive
            param_category: 7,
            param_number: 6, // CAPE
            level_type: 1,   // surface
            level_value: 0,
            forecast_hour: 0,
            data_values: vec![0.0; (ni * nj) as usize],
        }
    }

    pub fn with_reference_time(mut self, year: u16, month: u8, day: u8, hour: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self
    }

    pub fn with_template(mut self, template: GridTemplate) -> Self {
        self.template = template;
        self
    }

    /// Resize the grid; data is reset to zeros.
    pub fn with_grid(mut self, ni: u32, nj: u32) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.data_values = vec![0.0; (ni * nj) as usize];
        self
    }

    pub fn with_scanning_mode(mut self, mode: u8) -> Self {
        self.scanning_mode = mode;
        self
    }

    pub fn with_discipline(mut self, discipline: u8) -> Self {
        self.discipline = discipline;
        self
    }

    pub fn with_parameter(mut self, category: u8, number: u8) -> Self {
        self.param_category = category;
        self.param_number = number;
        self
    }

    pub fn with_level(mut self, level_type: u8, level_value: u32) -> Self {
        self.level_type = level_type;
        self.level_value = level_value;
        self
    }

    pub fn with_forecast_hour(mut self, hour: u32) -> Self {
        self.forecast_hour = hour;
        self
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    pub fn with_gradient(mut self, min_val: f32, max_val: f32) -> Self {
        let n = (self.ni * self.nj) as usize;
        self.data_values = (0..n)
            .map(|i| min_val + (max_val - min_val) * (i as f32 / n as f32))
            .collect();
        self
    }

    /// Row-major values, row 0 first. `NaN` entries are written as
    /// missing through a Section 6 bitmap.
    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            (self.ni * self.nj) as usize,
            "data length must match the grid"
        );
        self.data_values = data;
        self
    }

    /// Build the complete GRIB2 message bytes
    pub fn build(&self) -> Vec<u8> {
        let section1 = self.build_section1();
        let section3 = self.build_section3();
        let section4 = self.build_section4();
        let packing = Packing::from_values(&self.data_values);
        let section5 = self.build_section5(&packing);
        let section6 = self.build_section6();
        let section7 = self.build_section7(&packing);

        let message_length = 16
            + section1.len()
            + section3.len()
            + section4.len()
            + section5.len()
            + section6.len()
            + section7.len()
            + 4;

        let mut message = Vec::with_capacity(message_length);

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]); // Reserved
        message.push(self.discipline);
        message.push(2); // Edition 2
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        message.extend_from_slice(&section1);
        message.extend_from_slice(&section3);
        message.extend_from_slice(&section4);
        message.extend_from_slice(&section5);
        message.extend_from_slice(&section6);
        message.extend_from_slice(&section7);

        // Section 8: End
        message.extend_from_slice(b"7777");

        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::with_capacity(21);

        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1); // Section number

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(1); // Local table version
        section.push(1); // Significance of reference time (start of forecast)

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(0); // Minute
        section.push(0); // Second

        section.push(0); // Production status (operational)
        section.push(1); // Type of data (forecast)

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let (template_number, template) = match self.template {
            GridTemplate::LatLon => (0u16, self.lat_lon_template()),
            GridTemplate::LambertConformal => (30u16, self.lambert_template()),
        };

        let mut section = Vec::with_capacity(14 + template.len());
        section.extend_from_slice(&(14 + template.len() as u32).to_be_bytes());
        section.push(3); // Section number

        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0); // Number of octets for optional list
        section.push(0); // Interpretation of optional list
        section.extend_from_slice(&template_number.to_be_bytes());
        section.extend_from_slice(&template);

        section
    }

    /// Template 3.0 body (58 bytes), 0.25 degree spacing over the
    /// central US.
    fn lat_lon_template(&self) -> Vec<u8> {
        let mut t = Vec::with_capacity(58);
        earth_shape(&mut t);

        t.extend_from_slice(&self.ni.to_be_bytes()); // Ni
        t.extend_from_slice(&self.nj.to_be_bytes()); // Nj
        t.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
        t.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes()); // Subdivisions

        let step = 250_000i32; // microdegrees
        let la1 = 35_000_000;
        let lo1 = 260_000_000;
        t.extend_from_slice(&encode_signed_i32(la1)); // La1
        t.extend_from_slice(&encode_signed_i32(lo1)); // Lo1
        t.push(48); // Resolution and component flags
        t.extend_from_slice(&encode_signed_i32(la1 + step * (self.nj as i32 - 1))); // La2
        t.extend_from_slice(&encode_signed_i32(lo1 + step * (self.ni as i32 - 1))); // Lo2
        t.extend_from_slice(&(step as u32).to_be_bytes()); // Di
        t.extend_from_slice(&(step as u32).to_be_bytes()); // Dj
        t.push(self.scanning_mode);

        t
    }

    /// Template 3.30 body (67 bytes) with the HRRR CONUS projection.
    fn lambert_template(&self) -> Vec<u8> {
        let mut t = Vec::with_capacity(67);
        earth_shape(&mut t);

        t.extend_from_slice(&self.ni.to_be_bytes()); // Nx
        t.extend_from_slice(&self.nj.to_be_bytes()); // Ny
        t.extend_from_slice(&encode_signed_i32(21_138_123)); // La1
        t.extend_from_slice(&encode_signed_i32(237_280_472)); // Lo1
        t.push(8); // Resolution and component flags
        t.extend_from_slice(&encode_signed_i32(38_500_000)); // LaD
        t.extend_from_slice(&encode_signed_i32(262_500_000)); // LoV
        t.extend_from_slice(&3_000_000u32.to_be_bytes()); // Dx (mm)
        t.extend_from_slice(&3_000_000u32.to_be_bytes()); // Dy (mm)
        t.push(0); // Projection centre flag
        t.push(self.scanning_mode);
        t.extend_from_slice(&encode_signed_i32(38_500_000)); // Latin1
        t.extend_from_slice(&encode_signed_i32(38_500_000)); // Latin2
        t.extend_from_slice(&encode_signed_i32(-90_000_000)); // Lat of southern pole
        t.extend_from_slice(&encode_signed_i32(0)); // Lon of southern pole

        t
    }

    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::with_capacity(34);

        // Template 4.0: Analysis or forecast at horizontal level
        section.extend_from_slice(&34u32.to_be_bytes());
        section.push(4); // Section number

        section.extend_from_slice(&0u16.to_be_bytes()); // Number of coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // Product definition template (0)

        section.push(self.param_category);
        section.push(self.param_number);
        section.push(2); // Type of generating process (forecast)
        section.push(0); // Background generating process
        section.push(83); // Analysis or forecast process (HRRR)
        section.extend_from_slice(&0u16.to_be_bytes()); // Hours of cutoff
        section.push(0); // Minutes of cutoff
        section.push(1); // Time range unit (hours)
        section.extend_from_slice(&self.forecast_hour.to_be_bytes());

        section.push(self.level_type); // Type of first fixed surface
        section.push(0); // Scale factor
        section.extend_from_slice(&self.level_value.to_be_bytes());

        section.push(255); // Type of second fixed surface (none)
        section.push(0); // Scale factor
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn build_section5(&self, packing: &Packing) -> Vec<u8> {
        let mut section = Vec::with_capacity(21);

        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(5); // Section number

        // Number of packed values, which excludes bitmap-masked points
        section.extend_from_slice(&(packing.present as u32).to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0

        section.extend_from_slice(&packing.reference.to_be_bytes());
        section.extend_from_slice(&encode_signed_i16(packing.binary_scale));
        section.extend_from_slice(&encode_signed_i16(0)); // Decimal scale factor
        section.push(packing.bits);
        section.push(0); // Original field type (floating point)

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        if !self.data_values.iter().any(|v| v.is_nan()) {
            // 255 = no bitmap, all data present
            let mut section = 6u32.to_be_bytes().to_vec();
            section.extend_from_slice(&[6, 255]);
            return section;
        }

        let mut bitmap = vec![0u8; self.data_values.len().div_ceil(8)];
        for (i, value) in self.data_values.iter().enumerate() {
            if !value.is_nan() {
                bitmap[i / 8] |= 0x80 >> (i % 8);
            }
        }

        let mut section = (6 + bitmap.len() as u32).to_be_bytes().to_vec();
        section.extend_from_slice(&[6, 0]);
        section.extend_from_slice(&bitmap);
        section
    }

    fn build_section7(&self, packing: &Packing) -> Vec<u8> {
        let packed = packing.pack(&self.data_values);

        let mut section = Vec::with_capacity(5 + packed.len());
        section.extend_from_slice(&(5 + packed.len() as u32).to_be_bytes());
        section.push(7); // Section number
        section.extend_from_slice(&packed);

        section
    }
}

/// Concatenate several messages into one GRIB2 file image.
pub fn build_file(messages: &[Grib2Builder]) -> Vec<u8> {
    messages.iter().flat_map(|m| m.build()).collect()
}

/// Simple packing parameters for the non-missing values of a field.
struct Packing {
    reference: f32,
    binary_scale: i16,
    bits: u8,
    present: usize,
}

impl Packing {
    fn from_values(values: &[f32]) -> Self {
        let present: Vec<f32> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let (min_val, max_val) = present.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(min, max), &v| (min.min(v), max.max(v)),
        );

        if present.is_empty() || max_val == min_val {
            return Self {
                reference: if present.is_empty() { 0.0 } else { min_val },
                binary_scale: 0,
                bits: 0,
                present: present.len(),
            };
        }

        // 16-bit packing: value = R + X * 2^E with X <= 65535
        let range = (max_val - min_val) as f64;
        let binary_scale = (range / 65535.0).log2().ceil() as i16;

        Self {
            reference: min_val,
            binary_scale,
            bits: 16,
            present: present.len(),
        }
    }

    fn pack(&self, values: &[f32]) -> Vec<u8> {
        if self.bits == 0 {
            return Vec::new();
        }

        let scale = 2.0_f64.powi(self.binary_scale as i32);
        let reference = self.reference as f64;

        values
            .iter()
            .filter(|v| !v.is_nan())
            .flat_map(|&v| {
                let packed = ((v as f64 - reference) / scale).round().clamp(0.0, 65535.0) as u16;
                packed.to_be_bytes()
            })
            .collect()
    }
}

/// Earth shape block shared by templates 3.0 and 3.30 (16 bytes).
fn earth_shape(t: &mut Vec<u8>) {
    t.push(6); // Shape of Earth (spherical, radius 6371229 m)
    t.push(0); // Scale factor of radius
    t.extend_from_slice(&0u32.to_be_bytes());
    t.push(0); // Scale factor of major axis
    t.extend_from_slice(&0u32.to_be_bytes());
    t.push(0); // Scale factor of minor axis
    t.extend_from_slice(&0u32.to_be_bytes());
}

/// GRIB2 sign-magnitude encoding of a 16-bit integer.
pub fn encode_signed_i16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let raw = if value < 0 { 0x8000 | magnitude } else { magnitude };
    raw.to_be_bytes()
}

/// GRIB2 sign-magnitude encoding of a 32-bit integer.
pub fn encode_signed_i32(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let raw = if value < 0 {
        0x8000_0000 | magnitude
    } else {
        magnitude
    };
    raw.to_be_bytes()
}
