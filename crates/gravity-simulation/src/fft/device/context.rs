//! Device context: adapter selection, shared layouts, and resource caches
//!
//! ## Adapter selection
//!
//! | `DeviceOptions::adapter` | Behavior |
//! |-------|----------|
//! | `None` | wgpu `request_adapter` with the configured power preference |
//! | `0`, `1`, … | Select adapter by enumeration index |
//! | substring | Case-insensitive name match (e.g. `"intel"`, `"4070"`) |
//!
//! `SHADER_F64` is requested whenever the adapter offers it; kernels then run
//! in double precision, otherwise in single precision.

use super::buffers::GridBuffers;
use super::kernels::{source_hash, Kernel};
use super::plan::{FftPlan, PlanKey, PlanKind};
use super::Precision;
use crate::cache::{CacheStats, LruCache};
use crate::error::SimulationError;
use crate::params::DeviceOptions;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// Summary of the adapter a context runs on
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceInfo {
    pub name: String,
    pub backend: String,
    pub device_type: String,
    pub driver: String,
    pub precision: Precision,
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {}, {})",
            self.name, self.backend, self.device_type, self.precision
        )
    }
}

pub struct ComputeContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    info: DeviceInfo,
    poll_timeout: Duration,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,

    kernels: LruCache<u64, Arc<wgpu::ComputePipeline>>,
    plans: LruCache<PlanKey, Arc<FftPlan>>,
    buffers: LruCache<usize, Arc<GridBuffers>>,

    kernel_compiles: u64,
    plan_builds: u64,
    shut_down: bool,
}

fn layout_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl ComputeContext {
    /// Blocking wrapper around [`ComputeContext::new_async`]
    pub fn new(options: &DeviceOptions) -> Result<Self, SimulationError> {
        pollster::block_on(Self::new_async(options))
    }

    pub async fn new_async(options: &DeviceOptions) -> Result<Self, SimulationError> {
        options.validate()?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: options.backends,
            ..Default::default()
        });
        let adapter = select_adapter(&instance, options).await?;
        let adapter_info = adapter.get_info();

        let mut required_features = wgpu::Features::empty();
        if adapter.features().contains(wgpu::Features::SHADER_F64) {
            required_features |= wgpu::Features::SHADER_F64;
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Gravity PM Compute Device"),
                required_features,
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| SimulationError::BackendUnavailable(format!("device request failed: {e}")))?;

        let info = DeviceInfo {
            name: adapter_info.name.clone(),
            backend: format!("{:?}", adapter_info.backend),
            device_type: format!("{:?}", adapter_info.device_type),
            driver: adapter_info.driver.clone(),
            precision: Precision::from_features(required_features),
        };
        log::info!("Compute device ready: {info}");

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("FFT Bind Group Layout"),
            entries: &[
                layout_entry(0, wgpu::BufferBindingType::Uniform),
                layout_entry(1, wgpu::BufferBindingType::Storage { read_only: true }),
                layout_entry(2, wgpu::BufferBindingType::Storage { read_only: false }),
                layout_entry(3, wgpu::BufferBindingType::Storage { read_only: true }),
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("FFT Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let capacity = options.cache_capacity;
        Ok(Self {
            device,
            queue,
            info,
            poll_timeout: options.poll_timeout,
            bind_group_layout,
            pipeline_layout,
            kernels: LruCache::new(capacity),
            plans: LruCache::new(capacity),
            buffers: LruCache::new(capacity),
            kernel_compiles: 0,
            plan_builds: 0,
            shut_down: false,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn precision(&self) -> Precision {
        self.info.precision
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    fn ensure_active(&self) -> Result<(), SimulationError> {
        if self.shut_down {
            return Err(SimulationError::BackendUnavailable(
                "compute context has been shut down".into(),
            ));
        }
        Ok(())
    }

    /// Compiled pipeline for `kernel`, keyed by the hash of its final source
    pub fn kernel(&mut self, kernel: Kernel) -> Result<Arc<wgpu::ComputePipeline>, SimulationError> {
        self.ensure_active()?;
        let source = kernel.source(self.info.precision);
        let key = source_hash(&source);
        if let Some(pipeline) = self.kernels.get(&key) {
            return Ok(pipeline.clone());
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(kernel.label()),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline = self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(kernel.label()),
            layout: Some(&self.pipeline_layout),
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            log::error!("Failed to compile {}: {err}", kernel.label());
            return Err(SimulationError::BackendExecution(format!(
                "compiling {}: {err}",
                kernel.label()
            )));
        }

        self.kernel_compiles += 1;
        log::debug!("Compiled {} ({} precision)", kernel.label(), self.info.precision);
        let pipeline = Arc::new(pipeline);
        self.kernels.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Ping/pong/staging buffers for a grid of `elements` values
    pub fn grid_buffers(&mut self, elements: usize) -> Arc<GridBuffers> {
        if let Some(buffers) = self.buffers.get(&elements) {
            return buffers.clone();
        }
        let buffers = Arc::new(GridBuffers::new(&self.device, elements, self.info.precision));
        self.buffers.insert(elements, buffers.clone());
        buffers
    }

    /// Cached plan for `key`. A repeated key returns the same plan without
    /// recompiling kernels or rebuilding buffers.
    pub fn create_plan(&mut self, key: PlanKey) -> Result<Arc<FftPlan>, SimulationError> {
        self.ensure_active()?;
        if let Some(plan) = self.plans.get(&key) {
            log::debug!("FFT plan cache hit for {}x{} {:?}", key.width, key.height, key.direction);
            return Ok(plan.clone());
        }
        self.build_and_cache(key, key.preferred_kind())
    }

    /// Replace the cached plan for `key` with a direct-DFT plan
    pub fn demote_plan(&mut self, key: PlanKey) -> Result<Arc<FftPlan>, SimulationError> {
        self.ensure_active()?;
        if let Some(plan) = self.plans.peek(&key) {
            if plan.kind() == PlanKind::NaiveDft {
                return Ok(plan.clone());
            }
        }
        self.build_and_cache(key, PlanKind::NaiveDft)
    }

    fn build_and_cache(&mut self, key: PlanKey, kind: PlanKind) -> Result<Arc<FftPlan>, SimulationError> {
        let plan = Arc::new(FftPlan::build(self, key, kind)?);
        self.plan_builds += 1;
        log::debug!(
            "Built {kind:?} FFT plan for {}x{} {:?} ({} stages)",
            key.width,
            key.height,
            key.direction,
            plan.stage_count()
        );
        if let Some((evicted, _)) = self.plans.insert(key, plan.clone()) {
            log::debug!("Evicted FFT plan {}x{} {:?}", evicted.width, evicted.height, evicted.direction);
        }
        Ok(plan)
    }

    /// Map `staging` and copy out its first `size` bytes, bounded by the poll timeout
    pub fn read_back(&self, staging: &wgpu::Buffer, size: u64) -> Result<Vec<u8>, SimulationError> {
        let slice = staging.slice(..size);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        if let Err(e) = self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(self.poll_timeout),
        }) {
            staging.unmap();
            return Err(SimulationError::BackendExecution(format!("device poll: {e}")));
        }

        match receiver.recv_timeout(self.poll_timeout) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(SimulationError::BackendExecution(format!("buffer mapping: {e}")));
            }
            Err(_) => {
                staging.unmap();
                return Err(SimulationError::BackendExecution(format!(
                    "buffer mapping did not complete within {:?}",
                    self.poll_timeout
                )));
            }
        }

        let bytes = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(bytes)
    }

    pub fn kernel_compile_count(&self) -> u64 {
        self.kernel_compiles
    }

    pub fn plan_build_count(&self) -> u64 {
        self.plan_builds
    }

    pub fn cached_plan_count(&self) -> usize {
        self.plans.len()
    }

    pub fn cached_kernel_count(&self) -> usize {
        self.kernels.len()
    }

    pub fn cached_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn plan_cache_stats(&self) -> CacheStats {
        self.plans.stats()
    }

    /// Release every cached resource and the device. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.plans.clear();
        self.kernels.clear();
        for buffers in self.buffers.values() {
            buffers.destroy();
        }
        self.buffers.clear();
        self.device.destroy();
        self.shut_down = true;
        log::info!("Compute device {} shut down", self.info.name);
    }
}

impl Drop for ComputeContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn select_adapter(instance: &wgpu::Instance, options: &DeviceOptions) -> Result<wgpu::Adapter, SimulationError> {
    let Some(selector) = options.adapter.as_deref() else {
        return instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| SimulationError::BackendUnavailable(format!("no compatible adapter: {e}")));
    };

    let adapters = instance.enumerate_adapters(options.backends);
    if adapters.is_empty() {
        return Err(SimulationError::BackendUnavailable("no adapters found".into()));
    }

    let index = selector.parse::<usize>().ok().filter(|&i| i < adapters.len());
    let chosen = match index {
        Some(i) => adapters.into_iter().nth(i),
        None => adapters
            .into_iter()
            .find(|a| a.get_info().name.to_lowercase().contains(selector)),
    };
    chosen.ok_or_else(|| SimulationError::BackendUnavailable(format!("no adapter matching '{selector}'")))
}
