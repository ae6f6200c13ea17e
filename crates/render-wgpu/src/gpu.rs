use crate::context::GpuContext;
use spacekit_ecs::{Bitmap, FilterMode, VERTEX_STRIDE};
use spacekit_render::layout::{MESH_UNIFORM_SIZE, SCENE_UNIFORM_SIZE};
use spacekit_render::{
    BindingResource, BufferDesc, BufferUsage, PassCommand, PassDesc, PipelineDesc, RenderBackend,
    RenderError,
};
use std::cell::RefCell;
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Render pipeline with the bind-group layouts it was built against.
pub struct WgpuPipeline {
    pipeline: wgpu::RenderPipeline,
    scene_layout: wgpu::BindGroupLayout,
    mesh_layout: wgpu::BindGroupLayout,
}

/// Surface image being drawn this frame.
pub struct WgpuFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// [`RenderBackend`] over a window surface.
pub struct WgpuBackend {
    context: GpuContext,
    surface_config: RefCell<wgpu::SurfaceConfiguration>,
}

impl WgpuBackend {
    pub fn new(context: GpuContext) -> Self {
        let surface_config = RefCell::new(context.config.clone());
        Self {
            context,
            surface_config,
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.borrow().format
    }

    /// Reconfigure the surface for a new window size. The renderer's depth
    /// target is resized separately.
    pub fn resize_surface(&self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let mut config = self.surface_config.borrow_mut();
        config.width = width;
        config.height = height;
        self.context.surface.configure(&self.context.device, &config);
    }

    fn reconfigure(&self) {
        let config = self.surface_config.borrow();
        self.context.surface.configure(&self.context.device, &config);
    }

    fn scene_layout(&self) -> wgpu::BindGroupLayout {
        let storage = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        self.context
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("scene_bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: NonZeroU64::new(SCENE_UNIFORM_SIZE),
                        },
                        count: None,
                    },
                    storage(1),
                    storage(2),
                ],
            })
    }

    fn mesh_layout(&self) -> wgpu::BindGroupLayout {
        self.context
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("mesh_bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: NonZeroU64::new(MESH_UNIFORM_SIZE),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            })
    }
}

fn filter(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

impl RenderBackend for WgpuBackend {
    type Buffer = wgpu::Buffer;
    type Texture = wgpu::TextureView;
    type Sampler = wgpu::Sampler;
    type BindGroup = wgpu::BindGroup;
    type Pipeline = WgpuPipeline;
    type DepthTarget = wgpu::TextureView;
    type Target = WgpuFrame;

    fn create_pipeline(&self, desc: &PipelineDesc<'_>) -> Result<WgpuPipeline, RenderError> {
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        });
        let scene_layout = self.scene_layout();
        let mesh_layout = self.mesh_layout();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&scene_layout, &mesh_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: VERTEX_STRIDE,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x2,
                        2 => Float32x3,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::Pipeline(error.to_string()));
        }
        tracing::debug!(label = desc.label, "compiled render pipeline");

        Ok(WgpuPipeline {
            pipeline,
            scene_layout,
            mesh_layout,
        })
    }

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> wgpu::Buffer {
        let usage = match desc.usage {
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
            BufferUsage::Storage => wgpu::BufferUsages::STORAGE,
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
        };
        self.context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size: desc.size,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.context.queue.write_buffer(buffer, offset, data);
    }

    fn create_texture(&self, label: &str, bitmap: &Bitmap) -> wgpu::TextureView {
        let texture = self.context.device.create_texture_with_data(
            &self.context.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: bitmap.width().max(1),
                    height: bitmap.height().max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            bitmap.pixels(),
        );
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_sampler(&self, min_filter: FilterMode, mag_filter: FilterMode) -> wgpu::Sampler {
        self.context
            .device
            .create_sampler(&wgpu::SamplerDescriptor {
                label: Some("material_sampler"),
                mag_filter: filter(mag_filter),
                min_filter: filter(min_filter),
                ..Default::default()
            })
    }

    fn create_bind_group(
        &self,
        label: &str,
        pipeline: &WgpuPipeline,
        group: u32,
        resources: &[BindingResource<'_, Self>],
    ) -> wgpu::BindGroup {
        let layout = if group == 0 {
            &pipeline.scene_layout
        } else {
            &pipeline.mesh_layout
        };
        let entries: Vec<wgpu::BindGroupEntry<'_>> = resources
            .iter()
            .enumerate()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: match resource {
                    BindingResource::Buffer(buffer) => buffer.as_entire_binding(),
                    BindingResource::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler),
                    BindingResource::Texture(view) => wgpu::BindingResource::TextureView(view),
                },
            })
            .collect();
        self.context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &entries,
            })
    }

    fn create_depth_target(&self, width: u32, height: u32) -> wgpu::TextureView {
        let texture = self
            .context
            .device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("depth_texture"),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
        texture.create_view(&Default::default())
    }

    fn acquire_target(&self) -> Result<WgpuFrame, RenderError> {
        if self.context.is_device_lost() {
            return Err(RenderError::DeviceLost);
        }
        match self.context.surface.get_current_texture() {
            Ok(texture) => {
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(WgpuFrame { texture, view })
            }
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.reconfigure();
                Err(RenderError::TargetUnavailable(e.to_string()))
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(RenderError::OutOfMemory),
            Err(e) => Err(RenderError::TargetUnavailable(e.to_string())),
        }
    }

    fn submit_pass(&self, pass: &PassDesc<'_, Self>) {
        let [r, g, b, a] = pass.clear_color;
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render_encoder"),
                });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &pass.target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: pass.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            render_pass.set_pipeline(&pass.pipeline.pipeline);
            for command in pass.commands {
                match command {
                    PassCommand::SetBindGroup { index, bind_group } => {
                        render_pass.set_bind_group(*index, *bind_group, &[]);
                    }
                    PassCommand::SetVertexBuffer { slot, buffer } => {
                        render_pass.set_vertex_buffer(*slot, buffer.slice(..));
                    }
                    PassCommand::Draw {
                        vertex_count,
                        instance,
                    } => {
                        render_pass.draw(0..*vertex_count, *instance..*instance + 1);
                    }
                }
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
    }

    fn present(&self, target: WgpuFrame) {
        target.texture.present();
    }

    fn is_device_lost(&self) -> bool {
        self.context.is_device_lost()
    }
}
