//! FFT execution plans
//!
//! A plan is everything needed to run one `(width, height, direction)`
//! transform: the ordered stage list with per-stage uniforms and bind groups,
//! the twiddle table, and the ping/pong buffers the stages alternate between.

use super::buffers::{pack, unpack, GridBuffers};
use super::context::ComputeContext;
use super::kernels::{workgroups, Kernel};
use crate::error::SimulationError;
use crate::fft::{is_power_of_two, Direction};
use bytemuck::{Pod, Zeroable};
use num_complex::Complex64;
use std::sync::Arc;
use wgpu::util::DeviceExt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub width: usize,
    pub height: usize,
    pub direction: Direction,
}

impl PlanKey {
    pub fn new(width: usize, height: usize, direction: Direction) -> Self {
        Self {
            width,
            height,
            direction,
        }
    }

    pub fn elements(&self) -> usize {
        self.width * self.height
    }

    /// Cooley-Tukey when both dimensions are powers of two
    pub fn preferred_kind(&self) -> PlanKind {
        if is_power_of_two(self.width) && is_power_of_two(self.height) {
            PlanKind::CooleyTukey
        } else {
            PlanKind::NaiveDft
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanKind {
    /// Bit-reversal plus `log2 n` butterfly dispatches per axis
    CooleyTukey,
    /// One O(N²) dispatch
    NaiveDft,
}

/// Uniform block shared by every kernel (matches `FftParams` in WGSL)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct FftParams {
    pub width: u32,
    pub height: u32,
    pub axis: u32,
    pub stage: u32,
    pub direction: i32,
    pub normalize: u32,
    pub twiddle_offset: u32,
    pub bits: u32,
}

/// Host-side description of one dispatch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageSpec {
    pub kernel: Kernel,
    pub params: FftParams,
    pub workgroups: [u32; 3],
}

/// Ordered dispatches for a plan
pub fn stage_specs(key: PlanKey, kind: PlanKind) -> Vec<StageSpec> {
    let (w, h) = (key.width, key.height);
    let inverse = key.direction == Direction::Inverse;
    let base = FftParams {
        width: w as u32,
        height: h as u32,
        direction: key.direction.sign(),
        ..FftParams::default()
    };

    match kind {
        PlanKind::NaiveDft => vec![StageSpec {
            kernel: Kernel::NaiveDft,
            params: FftParams {
                normalize: inverse as u32,
                twiddle_offset: w as u32,
                ..base
            },
            workgroups: [workgroups(w), workgroups(h), 1],
        }],
        PlanKind::CooleyTukey => {
            let mut stages = Vec::new();
            // (axis, length, strips, twiddle offset)
            let axes = [(0u32, w, h, 0usize), (1u32, h, w, w / 2)];
            for (axis, n, strips, offset) in axes {
                if n <= 1 {
                    continue;
                }
                let bits = n.trailing_zeros();
                let axis_params = FftParams {
                    axis,
                    twiddle_offset: offset as u32,
                    bits,
                    ..base
                };
                let groups = [workgroups(n), workgroups(strips), 1];

                stages.push(StageSpec {
                    kernel: Kernel::BitReverse,
                    params: axis_params,
                    workgroups: groups,
                });
                for stage in 0..bits {
                    stages.push(StageSpec {
                        kernel: Kernel::Butterfly,
                        params: FftParams {
                            stage,
                            normalize: (inverse && stage + 1 == bits) as u32,
                            ..axis_params
                        },
                        workgroups: groups,
                    });
                }
            }
            stages
        }
    }
}

/// Twiddle factors laid out the way the kernels index them.
///
/// Cooley-Tukey: `n/2` factors for x, then `n/2` for z.
/// Direct DFT: `width` factors for x, then `height` for z.
pub fn twiddle_table(key: PlanKey, kind: PlanKind) -> Vec<Complex64> {
    let (w, h) = (key.width, key.height);
    let (row_len, col_len) = match kind {
        PlanKind::CooleyTukey => (w / 2, h / 2),
        PlanKind::NaiveDft => (w, h),
    };
    let dir = key.direction;
    (0..row_len)
        .map(|m| dir.twiddle(m, w))
        .chain((0..col_len).map(|m| dir.twiddle(m, h)))
        .collect()
}

struct Stage {
    label: String,
    pipeline: Arc<wgpu::ComputePipeline>,
    bind_group: wgpu::BindGroup,
    _params: wgpu::Buffer,
    workgroups: [u32; 3],
}

pub struct FftPlan {
    key: PlanKey,
    kind: PlanKind,
    stages: Vec<Stage>,
    buffers: Arc<GridBuffers>,
    _twiddles: wgpu::Buffer,
}

impl FftPlan {
    pub(crate) fn build(ctx: &mut ComputeContext, key: PlanKey, kind: PlanKind) -> Result<Self, SimulationError> {
        let specs = stage_specs(key, kind);

        // Compile (or fetch) every kernel before recording device errors for the plan itself
        let pipelines = specs
            .iter()
            .map(|spec| ctx.kernel(spec.kernel))
            .collect::<Result<Vec<_>, _>>()?;

        let buffers = ctx.grid_buffers(key.elements());
        let device = ctx.device();
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut twiddles = twiddle_table(key, kind);
        if twiddles.is_empty() {
            // storage bindings may not be zero-sized
            twiddles.push(Complex64::new(1.0, 0.0));
        }
        let twiddle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("FFT Twiddle Buffer"),
            contents: &pack(&twiddles, ctx.precision()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let stages = specs
            .iter()
            .zip(pipelines)
            .enumerate()
            .map(|(i, (spec, pipeline))| {
                let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("FFT Params Buffer"),
                    contents: bytemuck::bytes_of(&spec.params),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                // even stages read ping, odd stages read pong
                let (src, dst) = if i % 2 == 0 {
                    (&buffers.ping, &buffers.pong)
                } else {
                    (&buffers.pong, &buffers.ping)
                };
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("FFT Stage Bind Group"),
                    layout: ctx.bind_group_layout(),
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: params.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: src.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: dst.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: twiddle_buffer.as_entire_binding(),
                        },
                    ],
                });
                Stage {
                    label: format!("{} (axis {}, stage {})", spec.kernel.label(), spec.params.axis, spec.params.stage),
                    pipeline,
                    bind_group,
                    _params: params,
                    workgroups: spec.workgroups,
                }
            })
            .collect::<Vec<_>>();

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(SimulationError::BackendExecution(format!(
                "building {kind:?} plan {}x{}: {err}",
                key.width, key.height
            )));
        }

        Ok(Self {
            key,
            kind,
            stages,
            buffers,
            _twiddles: twiddle_buffer,
        })
    }

    pub fn key(&self) -> PlanKey {
        self.key
    }

    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Stages alternate ping→pong, pong→ping
    fn result_buffer(&self) -> &wgpu::Buffer {
        if self.stages.len() % 2 == 0 {
            &self.buffers.ping
        } else {
            &self.buffers.pong
        }
    }

    /// Upload, dispatch every stage in its own compute pass, read back
    pub fn execute(&self, ctx: &ComputeContext, input: &[Complex64]) -> Result<Vec<Complex64>, SimulationError> {
        if input.len() != self.key.elements() {
            return Err(SimulationError::Configuration(format!(
                "plan {}x{} given {} values",
                self.key.width,
                self.key.height,
                input.len()
            )));
        }
        let device = ctx.device();
        let queue = ctx.queue();
        let precision = ctx.precision();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        queue.write_buffer(&self.buffers.ping, 0, &pack(input, precision));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("FFT Encoder"),
        });
        for stage in &self.stages {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(stage.label.as_str()),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&stage.pipeline);
            compute_pass.set_bind_group(0, &stage.bind_group, &[]);
            let [x, y, z] = stage.workgroups;
            compute_pass.dispatch_workgroups(x, y, z);
        }
        encoder.copy_buffer_to_buffer(
            self.result_buffer(),
            0,
            &self.buffers.staging,
            0,
            self.buffers.byte_size,
        );
        queue.submit(std::iter::once(encoder.finish()));

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(SimulationError::BackendExecution(format!(
                "{:?} dispatch {}x{}: {err}",
                self.kind, self.key.width, self.key.height
            )));
        }

        let bytes = ctx.read_back(&self.buffers.staging, self.buffers.byte_size)?;
        let mut out = unpack(&bytes, precision);
        out.truncate(input.len());
        Ok(out)
    }
}
