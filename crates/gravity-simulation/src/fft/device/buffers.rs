//! Device buffers for one grid size

use super::Precision;
use num_complex::Complex64;

/// Ping/pong storage plus a mappable staging buffer for readback
pub struct GridBuffers {
    pub ping: wgpu::Buffer,
    pub pong: wgpu::Buffer,
    pub staging: wgpu::Buffer,
    pub elements: usize,
    pub byte_size: u64,
}

impl GridBuffers {
    pub fn new(device: &wgpu::Device, elements: usize, precision: Precision) -> Self {
        let byte_size = complex_bytes(elements, precision);

        let storage = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: byte_size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        let ping = storage("FFT Ping Buffer");
        let pong = storage("FFT Pong Buffer");

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FFT Staging Buffer"),
            size: byte_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            ping,
            pong,
            staging,
            elements,
            byte_size,
        }
    }

    pub fn destroy(&self) {
        self.ping.destroy();
        self.pong.destroy();
        self.staging.destroy();
    }
}

/// Size of `elements` interleaved (re, im) pairs
pub fn complex_bytes(elements: usize, precision: Precision) -> u64 {
    (elements.max(1) * 2 * precision.scalar_size()) as u64
}

/// Interleave as `[re, im, re, im, ...]` at the device precision
pub fn pack(data: &[Complex64], precision: Precision) -> Vec<u8> {
    match precision {
        Precision::F64 => {
            let flat: Vec<f64> = data.iter().flat_map(|c| [c.re, c.im]).collect();
            bytemuck::cast_slice(&flat).to_vec()
        }
        Precision::F32 => {
            let flat: Vec<f32> = data
                .iter()
                .flat_map(|c| [c.re as f32, c.im as f32])
                .collect();
            bytemuck::cast_slice(&flat).to_vec()
        }
    }
}

/// Inverse of [`pack`]. Mapped ranges carry no alignment guarantee, so
/// values are copied out rather than cast in place.
pub fn unpack(bytes: &[u8], precision: Precision) -> Vec<Complex64> {
    match precision {
        Precision::F64 => bytemuck::pod_collect_to_vec::<u8, f64>(bytes)
            .chunks_exact(2)
            .map(|p| Complex64::new(p[0], p[1]))
            .collect(),
        Precision::F32 => bytemuck::pod_collect_to_vec::<u8, f32>(bytes)
            .chunks_exact(2)
            .map(|p| Complex64::new(p[0] as f64, p[1] as f64))
            .collect(),
    }
}
