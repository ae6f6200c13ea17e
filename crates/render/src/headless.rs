//! GPU-free [`RenderBackend`] that records every call.
//!
//! Handles are plain integers. Buffer writes land in shadow memory so tests
//! can read back exactly what a GPU would have received. Device loss and
//! target acquisition failures can be injected.

use crate::{
    BindingResource, BufferDesc, BufferUsage, PassCommand, PassDesc, PipelineDesc, RenderBackend,
    RenderError,
};
use serde::Serialize;
use spacekit_ecs::{Bitmap, FilterMode};
use std::cell::{Cell, Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque id of anything the headless backend created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Handle(pub u32);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pass command with resources replaced by their handles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecordedCommand {
    SetBindGroup { index: u32, bind_group: Handle },
    SetVertexBuffer { slot: u32, buffer: Handle },
    Draw { vertex_count: u32, instance: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BackendEvent {
    CreatePipeline {
        handle: Handle,
        label: String,
    },
    CreateBuffer {
        handle: Handle,
        label: String,
        size: u64,
        usage: BufferUsage,
    },
    WriteBuffer {
        handle: Handle,
        offset: u64,
        len: usize,
    },
    CreateTexture {
        handle: Handle,
        label: String,
        width: u32,
        height: u32,
    },
    CreateSampler {
        handle: Handle,
        min_filter: FilterMode,
        mag_filter: FilterMode,
    },
    CreateBindGroup {
        handle: Handle,
        label: String,
        group: u32,
        resources: Vec<Handle>,
    },
    CreateDepthTarget {
        handle: Handle,
        width: u32,
        height: u32,
    },
    AcquireTarget {
        handle: Handle,
    },
    SubmitPass {
        target: Handle,
        depth: Handle,
        clear_color: [f64; 4],
        commands: Vec<RecordedCommand>,
    },
    Present {
        target: Handle,
    },
}

/// Per-kind call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackendSummary {
    pub pipelines: usize,
    pub buffers: usize,
    pub buffer_writes: usize,
    pub textures: usize,
    pub samplers: usize,
    pub bind_groups: usize,
    pub depth_targets: usize,
    pub passes: usize,
    pub draws: usize,
    pub presents: usize,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: Cell<u32>,
    events: RefCell<Vec<BackendEvent>>,
    memory: RefCell<BTreeMap<Handle, Vec<u8>>>,
    device_lost: Cell<bool>,
    fail_next_acquire: Cell<bool>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn events(&self) -> Ref<'_, Vec<BackendEvent>> {
        self.events.borrow()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    /// Current contents of a buffer.
    pub fn buffer_contents(&self, buffer: Handle) -> Option<Vec<u8>> {
        self.memory.borrow().get(&buffer).cloned()
    }

    /// Draw commands of the most recent pass.
    pub fn last_pass_draws(&self) -> Vec<(u32, u32)> {
        self.events
            .borrow()
            .iter()
            .rev()
            .find_map(|event| match event {
                BackendEvent::SubmitPass { commands, .. } => Some(
                    commands
                        .iter()
                        .filter_map(|c| match c {
                            RecordedCommand::Draw {
                                vertex_count,
                                instance,
                            } => Some((*vertex_count, *instance)),
                            _ => None,
                        })
                        .collect(),
                ),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn summary(&self) -> BackendSummary {
        let mut summary = BackendSummary::default();
        for event in self.events.borrow().iter() {
            match event {
                BackendEvent::CreatePipeline { .. } => summary.pipelines += 1,
                BackendEvent::CreateBuffer { .. } => summary.buffers += 1,
                BackendEvent::WriteBuffer { .. } => summary.buffer_writes += 1,
                BackendEvent::CreateTexture { .. } => summary.textures += 1,
                BackendEvent::CreateSampler { .. } => summary.samplers += 1,
                BackendEvent::CreateBindGroup { .. } => summary.bind_groups += 1,
                BackendEvent::CreateDepthTarget { .. } => summary.depth_targets += 1,
                BackendEvent::AcquireTarget { .. } => {}
                BackendEvent::SubmitPass { commands, .. } => {
                    summary.passes += 1;
                    summary.draws += commands
                        .iter()
                        .filter(|c| matches!(c, RecordedCommand::Draw { .. }))
                        .count();
                }
                BackendEvent::Present { .. } => summary.presents += 1,
            }
        }
        summary
    }

    /// Behave as if the device went away; observed on the next frame.
    pub fn simulate_device_loss(&self) {
        self.device_lost.set(true);
    }

    /// Make the next `acquire_target` fail as an outdated surface would.
    pub fn fail_next_acquire(&self) {
        self.fail_next_acquire.set(true);
    }

    fn allocate(&self) -> Handle {
        let id = self.next_handle.get();
        self.next_handle.set(id + 1);
        Handle(id)
    }

    fn record(&self, event: BackendEvent) {
        tracing::trace!(?event, "headless backend call");
        self.events.borrow_mut().push(event);
    }
}

impl RenderBackend for HeadlessBackend {
    type Buffer = Handle;
    type Texture = Handle;
    type Sampler = Handle;
    type BindGroup = Handle;
    type Pipeline = Handle;
    type DepthTarget = Handle;
    type Target = Handle;

    fn create_pipeline(&self, desc: &PipelineDesc<'_>) -> Result<Handle, RenderError> {
        for entry in ["vs_main", "fs_main"] {
            if !desc.source.contains(entry) {
                return Err(RenderError::Pipeline(format!(
                    "shader `{}` has no entry point `{entry}`",
                    desc.label
                )));
            }
        }
        let handle = self.allocate();
        self.record(BackendEvent::CreatePipeline {
            handle,
            label: desc.label.to_string(),
        });
        Ok(handle)
    }

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Handle {
        let handle = self.allocate();
        self.memory
            .borrow_mut()
            .insert(handle, vec![0; desc.size as usize]);
        self.record(BackendEvent::CreateBuffer {
            handle,
            label: desc.label.to_string(),
            size: desc.size,
            usage: desc.usage,
        });
        handle
    }

    fn write_buffer(&self, buffer: &Handle, offset: u64, data: &[u8]) {
        let mut memory = self.memory.borrow_mut();
        let Some(bytes) = memory.get_mut(buffer) else {
            tracing::error!(%buffer, "write to unknown buffer");
            return;
        };
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            tracing::error!(%buffer, end, size = bytes.len(), "buffer write out of bounds");
            return;
        }
        bytes[start..end].copy_from_slice(data);
        drop(memory);
        self.record(BackendEvent::WriteBuffer {
            handle: *buffer,
            offset,
            len: data.len(),
        });
    }

    fn create_texture(&self, label: &str, bitmap: &Bitmap) -> Handle {
        let handle = self.allocate();
        self.record(BackendEvent::CreateTexture {
            handle,
            label: label.to_string(),
            width: bitmap.width(),
            height: bitmap.height(),
        });
        handle
    }

    fn create_sampler(&self, min_filter: FilterMode, mag_filter: FilterMode) -> Handle {
        let handle = self.allocate();
        self.record(BackendEvent::CreateSampler {
            handle,
            min_filter,
            mag_filter,
        });
        handle
    }

    fn create_bind_group(
        &self,
        label: &str,
        _pipeline: &Handle,
        group: u32,
        resources: &[BindingResource<'_, Self>],
    ) -> Handle {
        let handle = self.allocate();
        let resources = resources
            .iter()
            .map(|r| match r {
                BindingResource::Buffer(h)
                | BindingResource::Sampler(h)
                | BindingResource::Texture(h) => **h,
            })
            .collect();
        self.record(BackendEvent::CreateBindGroup {
            handle,
            label: label.to_string(),
            group,
            resources,
        });
        handle
    }

    fn create_depth_target(&self, width: u32, height: u32) -> Handle {
        let handle = self.allocate();
        self.record(BackendEvent::CreateDepthTarget {
            handle,
            width,
            height,
        });
        handle
    }

    fn acquire_target(&self) -> Result<Handle, RenderError> {
        if self.device_lost.get() {
            return Err(RenderError::DeviceLost);
        }
        if self.fail_next_acquire.replace(false) {
            return Err(RenderError::TargetUnavailable("surface outdated".into()));
        }
        let handle = self.allocate();
        self.record(BackendEvent::AcquireTarget { handle });
        Ok(handle)
    }

    fn submit_pass(&self, pass: &PassDesc<'_, Self>) {
        let commands = pass
            .commands
            .iter()
            .map(|c| match c {
                PassCommand::SetBindGroup { index, bind_group } => RecordedCommand::SetBindGroup {
                    index: *index,
                    bind_group: **bind_group,
                },
                PassCommand::SetVertexBuffer { slot, buffer } => RecordedCommand::SetVertexBuffer {
                    slot: *slot,
                    buffer: **buffer,
                },
                PassCommand::Draw {
                    vertex_count,
                    instance,
                } => RecordedCommand::Draw {
                    vertex_count: *vertex_count,
                    instance: *instance,
                },
            })
            .collect();
        self.record(BackendEvent::SubmitPass {
            target: *pass.target,
            depth: *pass.depth,
            clear_color: pass.clear_color,
            commands,
        });
    }

    fn present(&self, target: Handle) {
        self.record(BackendEvent::Present { target });
    }

    fn is_device_lost(&self) -> bool {
        self.device_lost.get()
    }
}
