use windows::{
    core::Interface, core::PCSTR, Win32::Foundation::*, Win32::Graphics::Direct3D::Fxc::*,
    Win32::Graphics::Direct3D::*, Win32::Graphics::Direct3D12::*, Win32::Graphics::Dxgi::Common::*,
    Win32::Graphics::Dxgi::*, Win32::System::Threading::*,
};

use std::ffi::CString;
use std::mem::ManuallyDrop;

use crate::os::win32::Window;
use crate::Error;

/// The swap chain and all sample render targets share this format.
pub const SURFACE_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

/// Depth buffers share this format.
pub const DEPTH_FORMAT: DXGI_FORMAT = DXGI_FORMAT_D32_FLOAT;

// buffer offsets and texture row pitches must be aligned when copying through
// upload and readback heaps
const ROW_PITCH_ALIGN: u64 = D3D12_TEXTURE_DATA_PITCH_ALIGNMENT as u64;
const SUBRESOURCE_ALIGN: u64 = D3D12_TEXTURE_DATA_PLACEMENT_ALIGNMENT as u64;

fn align_up(value: u64, align: u64) -> u64 {
    (value + align - 1) / align * align
}

/// Returns the raw bytes of any sized value, for upload heap writes.
pub fn as_u8_slice<T: Sized>(p: &T) -> &[u8] {
    unsafe { std::slice::from_raw_parts((p as *const T) as *const u8, std::mem::size_of::<T>()) }
}

/// Information to create a device, heap sizes are in descriptor counts.
pub struct DeviceInfo {
    /// optional name of gpu adapter (substring match), use None for the primary device
    pub adapter_name: Option<String>,
    /// size of the shader visible heap for shader resources (textures, buffers, etc)
    pub shader_heap_size: usize,
    /// size of the heap for render target views
    pub render_target_heap_size: usize,
    /// size of the heap for depth stencil views
    pub depth_stencil_heap_size: usize,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        DeviceInfo {
            adapter_name: None,
            shader_heap_size: 64,
            render_target_heap_size: 32,
            depth_stencil_heap_size: 16,
        }
    }
}

/// A slot in a descriptor heap; gpu is only valid on shader visible heaps.
#[derive(Clone, Copy)]
pub struct DescriptorHandle {
    pub cpu: D3D12_CPU_DESCRIPTOR_HANDLE,
    pub gpu: D3D12_GPU_DESCRIPTOR_HANDLE,
    pub index: usize,
}

/// Fixed capacity slot allocator over a native descriptor heap. Slots are
/// handed out linearly and live for the lifetime of the process.
pub struct DescriptorHeap {
    heap: ID3D12DescriptorHeap,
    base_cpu: D3D12_CPU_DESCRIPTOR_HANDLE,
    base_gpu: D3D12_GPU_DESCRIPTOR_HANDLE,
    increment: usize,
    capacity: usize,
    offset: usize,
}

impl DescriptorHeap {
    fn create(
        device: &ID3D12Device,
        heap_type: D3D12_DESCRIPTOR_HEAP_TYPE,
        capacity: usize,
        shader_visible: bool,
    ) -> Result<DescriptorHeap, Error> {
        unsafe {
            let flags = if shader_visible {
                D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
            } else {
                D3D12_DESCRIPTOR_HEAP_FLAG_NONE
            };
            let heap: ID3D12DescriptorHeap = device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                Type: heap_type,
                NumDescriptors: capacity as u32,
                Flags: flags,
                ..Default::default()
            })?;
            let base_cpu = heap.GetCPUDescriptorHandleForHeapStart();
            let base_gpu = if shader_visible {
                heap.GetGPUDescriptorHandleForHeapStart()
            } else {
                D3D12_GPU_DESCRIPTOR_HANDLE::default()
            };
            Ok(DescriptorHeap {
                base_cpu,
                base_gpu,
                increment: device.GetDescriptorHandleIncrementSize(heap_type) as usize,
                capacity,
                offset: 0,
                heap,
            })
        }
    }

    /// Hands out the next free slot.
    pub fn allocate(&mut self) -> Result<DescriptorHandle, Error> {
        if self.offset >= self.capacity {
            return Err(Error {
                msg: format!(
                    "dx12_samples::gfx:: descriptor heap exhausted ({} slots)",
                    self.capacity
                ),
            });
        }
        let index = self.offset;
        self.offset += 1;
        Ok(DescriptorHandle {
            cpu: D3D12_CPU_DESCRIPTOR_HANDLE {
                ptr: self.base_cpu.ptr + index * self.increment,
            },
            gpu: D3D12_GPU_DESCRIPTOR_HANDLE {
                ptr: self.base_gpu.ptr + (index * self.increment) as u64,
            },
            index,
        })
    }

    pub fn get_heap(&self) -> &ID3D12DescriptorHeap {
        &self.heap
    }

    pub fn num_allocated(&self) -> usize {
        self.offset
    }
}

/// Owns the d3d12 device, direct queue and the descriptor allocators shared
/// by everything else, plus a dedicated command list for one shot uploads.
pub struct Device {
    adapter_info: String,
    #[allow(dead_code)]
    dxgi_factory: IDXGIFactory4,
    device: ID3D12Device,
    command_queue: ID3D12CommandQueue,
    shader_heap: DescriptorHeap,
    rtv_heap: DescriptorHeap,
    dsv_heap: DescriptorHeap,
    upload_command_allocator: ID3D12CommandAllocator,
    upload_command_list: ID3D12GraphicsCommandList,
    upload_fence: ID3D12Fence,
    upload_fence_value: u64,
    upload_fence_event: HANDLE,
}

fn get_hardware_adapter(
    factory: &IDXGIFactory4,
    adapter_name: &Option<String>,
) -> Result<(IDXGIAdapter1, String), Error> {
    unsafe {
        let mut first_hardware: Option<(IDXGIAdapter1, String)> = None;
        for i in 0.. {
            let adapter = match factory.EnumAdapters1(i) {
                Ok(adapter) => adapter,
                Err(_) => break,
            };
            let desc = adapter.GetDesc1()?;

            // skip the software rasterizer
            if (desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32) != 0 {
                continue;
            }

            // check the adapter supports d3d12 without creating the device yet
            if D3D12CreateDevice(
                &adapter,
                D3D_FEATURE_LEVEL_11_0,
                std::ptr::null_mut::<Option<ID3D12Device>>(),
            )
            .is_err()
            {
                continue;
            }

            let name = String::from_utf16_lossy(&desc.Description)
                .trim_end_matches('\0')
                .to_string();

            if let Some(request) = adapter_name {
                if name.to_lowercase().contains(&request.to_lowercase()) {
                    return Ok((adapter, name));
                }
            }
            if first_hardware.is_none() {
                first_hardware = Some((adapter, name));
            }
            if adapter_name.is_none() {
                break;
            }
        }
        // requested adapter not present, fall back to the primary one
        first_hardware.ok_or_else(|| Error {
            msg: String::from("dx12_samples::gfx:: no suitable d3d12 hardware adapter found"),
        })
    }
}

// silence the mismatching clear value warnings, the cubemap faces are cleared
// with per face colours
fn set_info_queue_filter(device: &ID3D12Device) {
    unsafe {
        if let Ok(info_queue) = device.cast::<ID3D12InfoQueue>() {
            let mut deny_ids = [
                D3D12_MESSAGE_ID_CLEARRENDERTARGETVIEW_MISMATCHINGCLEARVALUE,
                D3D12_MESSAGE_ID_CLEARDEPTHSTENCILVIEW_MISMATCHINGCLEARVALUE,
            ];
            let mut severities = [D3D12_MESSAGE_SEVERITY_INFO];
            let filter = D3D12_INFO_QUEUE_FILTER {
                DenyList: D3D12_INFO_QUEUE_FILTER_DESC {
                    NumIDs: deny_ids.len() as u32,
                    pIDList: deny_ids.as_mut_ptr(),
                    NumSeverities: severities.len() as u32,
                    pSeverityList: severities.as_mut_ptr(),
                    ..Default::default()
                },
                ..Default::default()
            };
            let _ = info_queue.PushStorageFilter(&filter);
        }
    }
}

impl Device {
    pub fn create(info: &DeviceInfo) -> Result<Device, Error> {
        unsafe {
            // enable debug layer
            let mut dxgi_factory_flags = DXGI_CREATE_FACTORY_FLAGS(0);
            if cfg!(debug_assertions) {
                let mut debug: Option<ID3D12Debug> = None;
                if D3D12GetDebugInterface(&mut debug).is_ok() {
                    if let Some(debug) = debug {
                        debug.EnableDebugLayer();
                        println!("dx12_samples::gfx:: enabling debug layer");
                    }
                }
                dxgi_factory_flags = DXGI_CREATE_FACTORY_DEBUG;
            }

            let dxgi_factory: IDXGIFactory4 = CreateDXGIFactory2(dxgi_factory_flags)?;
            let (adapter, adapter_info) = get_hardware_adapter(&dxgi_factory, &info.adapter_name)?;

            let mut d3d12_device: Option<ID3D12Device> = None;
            D3D12CreateDevice(&adapter, D3D_FEATURE_LEVEL_11_0, &mut d3d12_device)?;
            let device = d3d12_device.ok_or_else(|| Error {
                msg: String::from("dx12_samples::gfx:: failed to create d3d12 device"),
            })?;

            if cfg!(debug_assertions) {
                set_info_queue_filter(&device);
            }

            let command_queue: ID3D12CommandQueue =
                device.CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                    Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                    ..Default::default()
                })?;

            let shader_heap = DescriptorHeap::create(
                &device,
                D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
                info.shader_heap_size,
                true,
            )?;
            let rtv_heap = DescriptorHeap::create(
                &device,
                D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                info.render_target_heap_size,
                false,
            )?;
            let dsv_heap = DescriptorHeap::create(
                &device,
                D3D12_DESCRIPTOR_HEAP_TYPE_DSV,
                info.depth_stencil_heap_size,
                false,
            )?;

            // one shot command list for staging copies, created closed
            let upload_command_allocator: ID3D12CommandAllocator =
                device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)?;
            let upload_command_list: ID3D12GraphicsCommandList = device.CreateCommandList(
                0,
                D3D12_COMMAND_LIST_TYPE_DIRECT,
                &upload_command_allocator,
                None,
            )?;
            upload_command_list.Close()?;

            let upload_fence: ID3D12Fence = device.CreateFence(0, D3D12_FENCE_FLAG_NONE)?;
            let upload_fence_event = CreateEventA(None, false, false, None)?;

            Ok(Device {
                adapter_info,
                dxgi_factory,
                device,
                command_queue,
                shader_heap,
                rtv_heap,
                dsv_heap,
                upload_command_allocator,
                upload_command_list,
                upload_fence,
                upload_fence_value: 0,
                upload_fence_event,
            })
        }
    }

    pub fn get_adapter_info(&self) -> &str {
        &self.adapter_info
    }

    pub fn get_shader_heap(&self) -> &DescriptorHeap {
        &self.shader_heap
    }

    pub fn get_native_device(&self) -> &ID3D12Device {
        &self.device
    }

    pub fn create_swap_chain(&mut self, info: &SwapChainInfo, win: &Window) -> Result<SwapChain, Error> {
        unsafe {
            let rect = win.get_viewport_rect();
            let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
                BufferCount: info.num_buffers,
                Width: rect.width as u32,
                Height: rect.height as u32,
                Format: SURFACE_FORMAT,
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
                SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                ..Default::default()
            };

            let swap_chain: IDXGISwapChain1 = self.dxgi_factory.CreateSwapChainForHwnd(
                &self.command_queue,
                win.get_native_handle(),
                &swap_chain_desc,
                None,
                None,
            )?;
            let swap_chain: IDXGISwapChain3 = swap_chain.cast()?;

            let mut rtv_handles = Vec::new();
            let mut render_targets = Vec::new();
            for i in 0..info.num_buffers {
                let render_target: ID3D12Resource = swap_chain.GetBuffer(i)?;
                let handle = self.rtv_heap.allocate()?;
                self.device.CreateRenderTargetView(&render_target, None, handle.cpu);
                rtv_handles.push(handle);
                render_targets.push(render_target);
            }

            let dsv_handle = self.dsv_heap.allocate()?;
            let depth_buffer =
                create_depth_buffer(&self.device, rect.width as u64, rect.height as u32, dsv_handle)?;

            let fence: ID3D12Fence = self.device.CreateFence(0, D3D12_FENCE_FLAG_NONE)?;
            let fence_event = CreateEventA(None, false, false, None)?;

            Ok(SwapChain {
                num_buffers: info.num_buffers,
                vsync: info.vsync,
                width: rect.width,
                height: rect.height,
                frame_index: swap_chain.GetCurrentBackBufferIndex() as usize,
                swap_chain,
                render_targets,
                rtv_handles,
                depth_buffer,
                dsv_handle,
                fence,
                fence_event,
                fence_last_value: 0,
                fence_values: vec![0; info.num_buffers as usize],
            })
        }
    }

    pub fn create_cmd_buf(&self, num_buffers: u32) -> Result<CmdBuf, Error> {
        unsafe {
            let mut command_allocators = Vec::new();
            for _ in 0..num_buffers {
                let command_allocator: ID3D12CommandAllocator =
                    self.device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)?;
                command_allocators.push(command_allocator);
            }
            let command_list: ID3D12GraphicsCommandList = self.device.CreateCommandList(
                0,
                D3D12_COMMAND_LIST_TYPE_DIRECT,
                &command_allocators[0],
                None,
            )?;
            command_list.Close()?;
            Ok(CmdBuf {
                command_allocators,
                command_list,
            })
        }
    }

    fn create_committed_buffer(
        &self,
        size: u64,
        heap_type: D3D12_HEAP_TYPE,
        initial_state: D3D12_RESOURCE_STATES,
    ) -> Result<ID3D12Resource, Error> {
        unsafe {
            let mut resource: Option<ID3D12Resource> = None;
            self.device.CreateCommittedResource(
                &D3D12_HEAP_PROPERTIES {
                    Type: heap_type,
                    ..Default::default()
                },
                D3D12_HEAP_FLAG_NONE,
                &D3D12_RESOURCE_DESC {
                    Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
                    Width: size,
                    Height: 1,
                    DepthOrArraySize: 1,
                    MipLevels: 1,
                    SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                    Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
                    ..Default::default()
                },
                initial_state,
                None,
                &mut resource,
            )?;
            resource.ok_or_else(|| Error {
                msg: String::from("dx12_samples::gfx:: failed to create committed buffer"),
            })
        }
    }

    // records f on the dedicated upload list, submits and blocks until the
    // gpu has drained it; staging resources stay alive at the call site
    fn run_upload_commands<F>(&mut self, record: F) -> Result<(), Error>
    where
        F: FnOnce(&ID3D12GraphicsCommandList),
    {
        unsafe {
            self.upload_command_allocator.Reset()?;
            self.upload_command_list.Reset(&self.upload_command_allocator, None)?;
            record(&self.upload_command_list);
            self.upload_command_list.Close()?;

            let lists = [Some(ID3D12CommandList::from(&self.upload_command_list))];
            self.command_queue.ExecuteCommandLists(&lists);

            self.upload_fence_value += 1;
            self.command_queue.Signal(&self.upload_fence, self.upload_fence_value)?;
            if self.upload_fence.GetCompletedValue() < self.upload_fence_value {
                self.upload_fence
                    .SetEventOnCompletion(self.upload_fence_value, self.upload_fence_event)?;
                WaitForSingleObject(self.upload_fence_event, INFINITE);
            }
            Ok(())
        }
    }

    /// Uploads vertex and index data into gpu local buffers through upload
    /// heap staging and transitions them for input assembler use.
    pub fn create_mesh<T: Sized>(&mut self, vertices: &[T], indices: &[u32]) -> Result<Mesh, Error> {
        let vb_size = (std::mem::size_of::<T>() * vertices.len()) as u64;
        let ib_size = (std::mem::size_of::<u32>() * indices.len()) as u64;

        let vb = self.create_committed_buffer(vb_size, D3D12_HEAP_TYPE_DEFAULT, D3D12_RESOURCE_STATE_COPY_DEST)?;
        let ib = self.create_committed_buffer(ib_size, D3D12_HEAP_TYPE_DEFAULT, D3D12_RESOURCE_STATE_COPY_DEST)?;

        let upload_vb =
            self.create_committed_buffer(vb_size, D3D12_HEAP_TYPE_UPLOAD, D3D12_RESOURCE_STATE_GENERIC_READ)?;
        let upload_ib =
            self.create_committed_buffer(ib_size, D3D12_HEAP_TYPE_UPLOAD, D3D12_RESOURCE_STATE_GENERIC_READ)?;

        unsafe {
            let mut map_data = std::ptr::null_mut();
            upload_vb.Map(0, None, Some(&mut map_data))?;
            std::ptr::copy_nonoverlapping(vertices.as_ptr() as *const u8, map_data as *mut u8, vb_size as usize);
            upload_vb.Unmap(0, None);

            let mut map_data = std::ptr::null_mut();
            upload_ib.Map(0, None, Some(&mut map_data))?;
            std::ptr::copy_nonoverlapping(indices.as_ptr() as *const u8, map_data as *mut u8, ib_size as usize);
            upload_ib.Unmap(0, None);
        }

        self.run_upload_commands(|cmd| unsafe {
            cmd.CopyResource(&vb, &upload_vb);
            cmd.CopyResource(&ib, &upload_ib);
            let barriers = [
                transition_barrier(
                    &vb,
                    D3D12_RESOURCE_STATE_COPY_DEST,
                    D3D12_RESOURCE_STATE_VERTEX_AND_CONSTANT_BUFFER,
                ),
                transition_barrier(&ib, D3D12_RESOURCE_STATE_COPY_DEST, D3D12_RESOURCE_STATE_INDEX_BUFFER),
            ];
            cmd.ResourceBarrier(&barriers);
            release_barriers(barriers);
        })?;

        let vbv = D3D12_VERTEX_BUFFER_VIEW {
            BufferLocation: unsafe { vb.GetGPUVirtualAddress() },
            StrideInBytes: std::mem::size_of::<T>() as u32,
            SizeInBytes: vb_size as u32,
        };
        let ibv = D3D12_INDEX_BUFFER_VIEW {
            BufferLocation: unsafe { ib.GetGPUVirtualAddress() },
            SizeInBytes: ib_size as u32,
            Format: DXGI_FORMAT_R32_UINT,
        };

        Ok(Mesh {
            vb,
            ib,
            vbv,
            ibv,
            num_indices: indices.len() as u32,
        })
    }

    /// Creates the parallel per frame in flight copies of a constant buffer.
    pub fn create_constant_buffer<T: Sized>(&mut self, count: usize) -> Result<ConstantBuffer<T>, Error> {
        let size = align_up(std::mem::size_of::<T>() as u64, D3D12_CONSTANT_BUFFER_DATA_PLACEMENT_ALIGNMENT as u64);
        let mut buffers = Vec::new();
        let mut mapped = Vec::new();
        for _ in 0..count {
            let buffer =
                self.create_committed_buffer(size, D3D12_HEAP_TYPE_UPLOAD, D3D12_RESOURCE_STATE_GENERIC_READ)?;
            unsafe {
                let mut map_data = std::ptr::null_mut();
                buffer.Map(0, None, Some(&mut map_data))?;
                mapped.push(map_data as *mut u8);
            }
            buffers.push(buffer);
        }
        Ok(ConstantBuffer {
            buffers,
            mapped,
            _marker: std::marker::PhantomData,
        })
    }

    /// Creates a texture, optionally uploading rgba8 data tightly packed per
    /// array layer through an aligned staging buffer.
    pub fn create_texture(&mut self, info: &TextureInfo, data: Option<&[u8]>) -> Result<Texture, Error> {
        let mut flags = D3D12_RESOURCE_FLAG_NONE;
        if info.usage.contains(TextureUsage::RENDER_TARGET) {
            flags |= D3D12_RESOURCE_FLAG_ALLOW_RENDER_TARGET;
        }
        if info.usage.contains(TextureUsage::DEPTH_STENCIL) {
            flags |= D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL;
        }
        if info.usage.contains(TextureUsage::UNORDERED_ACCESS) {
            flags |= D3D12_RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS;
        }

        let initial_state = if data.is_some() {
            D3D12_RESOURCE_STATE_COPY_DEST
        } else if info.usage.contains(TextureUsage::RENDER_TARGET) {
            D3D12_RESOURCE_STATE_RENDER_TARGET
        } else if info.usage.contains(TextureUsage::DEPTH_STENCIL) {
            D3D12_RESOURCE_STATE_DEPTH_WRITE
        } else if info.usage.contains(TextureUsage::UNORDERED_ACCESS) {
            D3D12_RESOURCE_STATE_UNORDERED_ACCESS
        } else {
            D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE
        };

        let clear_value = D3D12_CLEAR_VALUE {
            Format: DEPTH_FORMAT,
            Anonymous: D3D12_CLEAR_VALUE_0 {
                DepthStencil: D3D12_DEPTH_STENCIL_VALUE { Depth: 1.0, Stencil: 0 },
            },
        };
        let opt_clear = if info.usage.contains(TextureUsage::DEPTH_STENCIL) {
            Some(&clear_value as *const D3D12_CLEAR_VALUE)
        } else {
            None
        };

        let resource = unsafe {
            let mut resource: Option<ID3D12Resource> = None;
            self.device.CreateCommittedResource(
                &D3D12_HEAP_PROPERTIES {
                    Type: D3D12_HEAP_TYPE_DEFAULT,
                    ..Default::default()
                },
                D3D12_HEAP_FLAG_NONE,
                &D3D12_RESOURCE_DESC {
                    Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
                    Width: info.width,
                    Height: info.height as u32,
                    DepthOrArraySize: info.array_layers as u16,
                    MipLevels: info.mip_levels as u16,
                    Format: info.format,
                    SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                    Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
                    Flags: flags,
                    ..Default::default()
                },
                initial_state,
                opt_clear,
                &mut resource,
            )?;
            resource.ok_or_else(|| Error {
                msg: String::from("dx12_samples::gfx:: failed to create texture"),
            })?
        };

        if let Some(data) = data {
            self.upload_texture_data(&resource, info, data)?;
        }

        let mut texture = Texture {
            resource,
            srv: None,
            uav: None,
            rtv: None,
            dsv: None,
            face_rtvs: Vec::new(),
            face_dsvs: Vec::new(),
        };

        if info.usage.contains(TextureUsage::SHADER_RESOURCE) {
            texture.srv = Some(self.create_texture_srv(&texture.resource, info)?);
        }
        if info.usage.contains(TextureUsage::UNORDERED_ACCESS) {
            let handle = self.shader_heap.allocate()?;
            unsafe {
                self.device.CreateUnorderedAccessView(
                    &texture.resource,
                    None::<&ID3D12Resource>,
                    Some(&D3D12_UNORDERED_ACCESS_VIEW_DESC {
                        Format: info.format,
                        ViewDimension: D3D12_UAV_DIMENSION_TEXTURE2D,
                        Anonymous: D3D12_UNORDERED_ACCESS_VIEW_DESC_0 {
                            Texture2D: D3D12_TEX2D_UAV::default(),
                        },
                    }),
                    handle.cpu,
                );
            }
            texture.uav = Some(handle);
        }
        if info.usage.contains(TextureUsage::RENDER_TARGET) {
            self.create_texture_rtvs(&mut texture, info)?;
        }
        if info.usage.contains(TextureUsage::DEPTH_STENCIL) {
            self.create_texture_dsvs(&mut texture, info)?;
        }

        Ok(texture)
    }

    fn upload_texture_data(
        &mut self,
        resource: &ID3D12Resource,
        info: &TextureInfo,
        data: &[u8],
    ) -> Result<(), Error> {
        let tight_pitch = info.width * 4;
        let staged_pitch = align_up(tight_pitch, ROW_PITCH_ALIGN);
        let staged_layer_size = align_up(staged_pitch * info.height, SUBRESOURCE_ALIGN);
        let staging = self.create_committed_buffer(
            staged_layer_size * info.array_layers as u64,
            D3D12_HEAP_TYPE_UPLOAD,
            D3D12_RESOURCE_STATE_GENERIC_READ,
        )?;

        unsafe {
            let mut map_data = std::ptr::null_mut();
            staging.Map(0, None, Some(&mut map_data))?;
            let mapped = map_data as *mut u8;
            for layer in 0..info.array_layers as u64 {
                for row in 0..info.height {
                    let src = (layer * info.height + row) * tight_pitch;
                    let dst = layer * staged_layer_size + row * staged_pitch;
                    std::ptr::copy_nonoverlapping(
                        data.as_ptr().add(src as usize),
                        mapped.add(dst as usize),
                        tight_pitch as usize,
                    );
                }
            }
            staging.Unmap(0, None);
        }

        self.run_upload_commands(|cmd| unsafe {
            for layer in 0..info.array_layers {
                let dst = D3D12_TEXTURE_COPY_LOCATION {
                    pResource: ManuallyDrop::new(Some(resource.clone())),
                    Type: D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX,
                    Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                        SubresourceIndex: layer * info.mip_levels,
                    },
                };
                let src = D3D12_TEXTURE_COPY_LOCATION {
                    pResource: ManuallyDrop::new(Some(staging.clone())),
                    Type: D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT,
                    Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                        PlacedFootprint: D3D12_PLACED_SUBRESOURCE_FOOTPRINT {
                            Offset: layer as u64 * staged_layer_size,
                            Footprint: D3D12_SUBRESOURCE_FOOTPRINT {
                                Format: info.format,
                                Width: info.width as u32,
                                Height: info.height as u32,
                                Depth: 1,
                                RowPitch: staged_pitch as u32,
                            },
                        },
                    },
                };
                cmd.CopyTextureRegion(&dst, 0, 0, 0, &src, None);
                let _ = ManuallyDrop::into_inner(dst.pResource);
                let _ = ManuallyDrop::into_inner(src.pResource);
            }
            let barriers = [transition_barrier(
                resource,
                D3D12_RESOURCE_STATE_COPY_DEST,
                D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
            )];
            cmd.ResourceBarrier(&barriers);
            release_barriers(barriers);
        })
    }

    fn create_texture_srv(&mut self, resource: &ID3D12Resource, info: &TextureInfo) -> Result<DescriptorHandle, Error> {
        let handle = self.shader_heap.allocate()?;
        unsafe {
            let desc = if info.tex_type == TextureType::TextureCube {
                D3D12_SHADER_RESOURCE_VIEW_DESC {
                    Format: info.format,
                    ViewDimension: D3D12_SRV_DIMENSION_TEXTURECUBE,
                    Shader4ComponentMapping: D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING,
                    Anonymous: D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                        TextureCube: D3D12_TEXCUBE_SRV {
                            MipLevels: info.mip_levels,
                            ..Default::default()
                        },
                    },
                }
            } else {
                D3D12_SHADER_RESOURCE_VIEW_DESC {
                    Format: info.format,
                    ViewDimension: D3D12_SRV_DIMENSION_TEXTURE2D,
                    Shader4ComponentMapping: D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING,
                    Anonymous: D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                        Texture2D: D3D12_TEX2D_SRV {
                            MipLevels: info.mip_levels,
                            ..Default::default()
                        },
                    },
                }
            };
            self.device.CreateShaderResourceView(resource, Some(&desc), handle.cpu);
        }
        Ok(handle)
    }

    fn create_texture_rtvs(&mut self, texture: &mut Texture, info: &TextureInfo) -> Result<(), Error> {
        unsafe {
            if info.array_layers > 1 {
                // one view of the whole array for single pass rendering
                let handle = self.rtv_heap.allocate()?;
                self.device.CreateRenderTargetView(
                    &texture.resource,
                    Some(&D3D12_RENDER_TARGET_VIEW_DESC {
                        Format: info.format,
                        ViewDimension: D3D12_RTV_DIMENSION_TEXTURE2DARRAY,
                        Anonymous: D3D12_RENDER_TARGET_VIEW_DESC_0 {
                            Texture2DArray: D3D12_TEX2D_ARRAY_RTV {
                                FirstArraySlice: 0,
                                ArraySize: info.array_layers,
                                ..Default::default()
                            },
                        },
                    }),
                    handle.cpu,
                );
                texture.rtv = Some(handle);

                // and one per slice for multi pass rendering
                for i in 0..info.array_layers {
                    let handle = self.rtv_heap.allocate()?;
                    self.device.CreateRenderTargetView(
                        &texture.resource,
                        Some(&D3D12_RENDER_TARGET_VIEW_DESC {
                            Format: info.format,
                            ViewDimension: D3D12_RTV_DIMENSION_TEXTURE2DARRAY,
                            Anonymous: D3D12_RENDER_TARGET_VIEW_DESC_0 {
                                Texture2DArray: D3D12_TEX2D_ARRAY_RTV {
                                    FirstArraySlice: i,
                                    ArraySize: 1,
                                    ..Default::default()
                                },
                            },
                        }),
                        handle.cpu,
                    );
                    texture.face_rtvs.push(handle);
                }
            } else {
                let handle = self.rtv_heap.allocate()?;
                self.device.CreateRenderTargetView(&texture.resource, None, handle.cpu);
                texture.rtv = Some(handle);
            }
        }
        Ok(())
    }

    fn create_texture_dsvs(&mut self, texture: &mut Texture, info: &TextureInfo) -> Result<(), Error> {
        unsafe {
            if info.array_layers > 1 {
                let handle = self.dsv_heap.allocate()?;
                self.device.CreateDepthStencilView(
                    &texture.resource,
                    Some(&D3D12_DEPTH_STENCIL_VIEW_DESC {
                        Format: info.format,
                        ViewDimension: D3D12_DSV_DIMENSION_TEXTURE2DARRAY,
                        Anonymous: D3D12_DEPTH_STENCIL_VIEW_DESC_0 {
                            Texture2DArray: D3D12_TEX2D_ARRAY_DSV {
                                FirstArraySlice: 0,
                                ArraySize: info.array_layers,
                                ..Default::default()
                            },
                        },
                        ..Default::default()
                    }),
                    handle.cpu,
                );
                texture.dsv = Some(handle);

                for i in 0..info.array_layers {
                    let handle = self.dsv_heap.allocate()?;
                    self.device.CreateDepthStencilView(
                        &texture.resource,
                        Some(&D3D12_DEPTH_STENCIL_VIEW_DESC {
                            Format: info.format,
                            ViewDimension: D3D12_DSV_DIMENSION_TEXTURE2DARRAY,
                            Anonymous: D3D12_DEPTH_STENCIL_VIEW_DESC_0 {
                                Texture2DArray: D3D12_TEX2D_ARRAY_DSV {
                                    FirstArraySlice: i,
                                    ArraySize: 1,
                                    ..Default::default()
                                },
                            },
                            ..Default::default()
                        }),
                        handle.cpu,
                    );
                    texture.face_dsvs.push(handle);
                }
            } else {
                let handle = self.dsv_heap.allocate()?;
                self.device.CreateDepthStencilView(&texture.resource, None, handle.cpu);
                texture.dsv = Some(handle);
            }
        }
        Ok(())
    }

    /// Copies a single subresource rgba8 texture into cpu memory; the texture
    /// is transitioned from `state` to copy source and back again.
    pub fn read_back_texture(
        &mut self,
        texture: &Texture,
        width: u64,
        height: u64,
        state: D3D12_RESOURCE_STATES,
    ) -> Result<ReadBackData, Error> {
        let row_pitch = align_up(width * 4, ROW_PITCH_ALIGN);
        let buffer_size = row_pitch * height;
        let readback =
            self.create_committed_buffer(buffer_size, D3D12_HEAP_TYPE_READBACK, D3D12_RESOURCE_STATE_COPY_DEST)?;

        self.run_upload_commands(|cmd| unsafe {
            let barriers = [transition_barrier(&texture.resource, state, D3D12_RESOURCE_STATE_COPY_SOURCE)];
            cmd.ResourceBarrier(&barriers);
            release_barriers(barriers);

            let dst = D3D12_TEXTURE_COPY_LOCATION {
                pResource: ManuallyDrop::new(Some(readback.clone())),
                Type: D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT,
                Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                    PlacedFootprint: D3D12_PLACED_SUBRESOURCE_FOOTPRINT {
                        Offset: 0,
                        Footprint: D3D12_SUBRESOURCE_FOOTPRINT {
                            Format: SURFACE_FORMAT,
                            Width: width as u32,
                            Height: height as u32,
                            Depth: 1,
                            RowPitch: row_pitch as u32,
                        },
                    },
                },
            };
            let src = D3D12_TEXTURE_COPY_LOCATION {
                pResource: ManuallyDrop::new(Some(texture.resource.clone())),
                Type: D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX,
                Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 { SubresourceIndex: 0 },
            };
            cmd.CopyTextureRegion(&dst, 0, 0, 0, &src, None);
            let _ = ManuallyDrop::into_inner(dst.pResource);
            let _ = ManuallyDrop::into_inner(src.pResource);

            let barriers = [transition_barrier(&texture.resource, D3D12_RESOURCE_STATE_COPY_SOURCE, state)];
            cmd.ResourceBarrier(&barriers);
            release_barriers(barriers);
        })?;

        let mut data = vec![0u8; buffer_size as usize];
        unsafe {
            let mut map_data = std::ptr::null_mut();
            readback.Map(0, None, Some(&mut map_data))?;
            std::ptr::copy_nonoverlapping(map_data as *const u8, data.as_mut_ptr(), buffer_size as usize);
            readback.Unmap(0, None);
        }

        Ok(ReadBackData {
            data,
            row_pitch: row_pitch as u32,
            width: width as u32,
            height: height as u32,
        })
    }

    /// Builds a root signature from root cbv and descriptor table parameters
    /// with an optional static linear sampler at s0.
    pub fn create_root_signature(
        &self,
        params: &[RootParam],
        linear_sampler: bool,
    ) -> Result<ID3D12RootSignature, Error> {
        unsafe {
            // descriptor ranges must outlive serialisation, one per table param
            let mut ranges = Vec::with_capacity(params.len());
            for param in params {
                match param {
                    RootParam::Srv { register } => ranges.push(D3D12_DESCRIPTOR_RANGE {
                        RangeType: D3D12_DESCRIPTOR_RANGE_TYPE_SRV,
                        NumDescriptors: 1,
                        BaseShaderRegister: *register,
                        ..Default::default()
                    }),
                    RootParam::Uav { register } => ranges.push(D3D12_DESCRIPTOR_RANGE {
                        RangeType: D3D12_DESCRIPTOR_RANGE_TYPE_UAV,
                        NumDescriptors: 1,
                        BaseShaderRegister: *register,
                        ..Default::default()
                    }),
                    RootParam::Cbv { .. } => {}
                }
            }

            let mut range_index = 0;
            let mut parameters = Vec::with_capacity(params.len());
            for param in params {
                match param {
                    RootParam::Cbv { register } => parameters.push(D3D12_ROOT_PARAMETER {
                        ParameterType: D3D12_ROOT_PARAMETER_TYPE_CBV,
                        Anonymous: D3D12_ROOT_PARAMETER_0 {
                            Descriptor: D3D12_ROOT_DESCRIPTOR {
                                ShaderRegister: *register,
                                RegisterSpace: 0,
                            },
                        },
                        ShaderVisibility: D3D12_SHADER_VISIBILITY_ALL,
                    }),
                    RootParam::Srv { .. } | RootParam::Uav { .. } => {
                        parameters.push(D3D12_ROOT_PARAMETER {
                            ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
                            Anonymous: D3D12_ROOT_PARAMETER_0 {
                                DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE {
                                    NumDescriptorRanges: 1,
                                    pDescriptorRanges: &ranges[range_index],
                                },
                            },
                            ShaderVisibility: D3D12_SHADER_VISIBILITY_ALL,
                        });
                        range_index += 1;
                    }
                }
            }

            let sampler = D3D12_STATIC_SAMPLER_DESC {
                Filter: D3D12_FILTER_MIN_MAG_MIP_LINEAR,
                AddressU: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
                AddressV: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
                AddressW: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
                MaxLOD: f32::MAX,
                ShaderRegister: 0,
                RegisterSpace: 0,
                ShaderVisibility: D3D12_SHADER_VISIBILITY_ALL,
                ..Default::default()
            };

            let desc = D3D12_ROOT_SIGNATURE_DESC {
                NumParameters: parameters.len() as u32,
                pParameters: parameters.as_ptr(),
                NumStaticSamplers: if linear_sampler { 1 } else { 0 },
                pStaticSamplers: if linear_sampler { &sampler } else { std::ptr::null() },
                Flags: D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
            };

            let mut signature = None;
            let mut error = None;
            let serialise =
                D3D12SerializeRootSignature(&desc, D3D_ROOT_SIGNATURE_VERSION_1, &mut signature, Some(&mut error));
            if let Some(error) = error {
                let msg = std::slice::from_raw_parts(error.GetBufferPointer() as *const u8, error.GetBufferSize());
                return Err(Error {
                    msg: format!(
                        "dx12_samples::gfx:: root signature serialise failed: {}",
                        String::from_utf8_lossy(msg)
                    ),
                });
            }
            serialise?;
            let signature = signature.ok_or_else(|| Error {
                msg: String::from("dx12_samples::gfx:: root signature serialise returned no blob"),
            })?;

            let root_signature = self.device.CreateRootSignature(
                0,
                std::slice::from_raw_parts(signature.GetBufferPointer() as *const u8, signature.GetBufferSize()),
            )?;
            Ok(root_signature)
        }
    }

    /// Creates a graphics pipeline with the shared defaults the samples use;
    /// single render target, depth test enabled against a d32 buffer.
    pub fn create_render_pipeline(&self, info: &RenderPipelineInfo) -> Result<ID3D12PipelineState, Error> {
        unsafe {
            let mut desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
                pRootSignature: ManuallyDrop::new(Some(info.root_signature.clone())),
                VS: info.vs.map(|s| s.bytecode()).unwrap_or_default(),
                PS: info.ps.map(|s| s.bytecode()).unwrap_or_default(),
                GS: info.gs.map(|s| s.bytecode()).unwrap_or_default(),
                HS: info.hs.map(|s| s.bytecode()).unwrap_or_default(),
                DS: info.ds.map(|s| s.bytecode()).unwrap_or_default(),
                BlendState: D3D12_BLEND_DESC {
                    AlphaToCoverageEnable: false.into(),
                    IndependentBlendEnable: false.into(),
                    RenderTarget: [
                        D3D12_RENDER_TARGET_BLEND_DESC {
                            BlendEnable: false.into(),
                            LogicOpEnable: false.into(),
                            SrcBlend: D3D12_BLEND_ONE,
                            DestBlend: D3D12_BLEND_ZERO,
                            BlendOp: D3D12_BLEND_OP_ADD,
                            SrcBlendAlpha: D3D12_BLEND_ONE,
                            DestBlendAlpha: D3D12_BLEND_ZERO,
                            BlendOpAlpha: D3D12_BLEND_OP_ADD,
                            LogicOp: D3D12_LOGIC_OP_NOOP,
                            RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
                        },
                        Default::default(),
                        Default::default(),
                        Default::default(),
                        Default::default(),
                        Default::default(),
                        Default::default(),
                        Default::default(),
                    ],
                },
                SampleMask: u32::MAX,
                RasterizerState: D3D12_RASTERIZER_DESC {
                    FillMode: if info.wireframe {
                        D3D12_FILL_MODE_WIREFRAME
                    } else {
                        D3D12_FILL_MODE_SOLID
                    },
                    CullMode: info.cull_mode,
                    FrontCounterClockwise: info.front_ccw.into(),
                    DepthClipEnable: true.into(),
                    ..Default::default()
                },
                DepthStencilState: D3D12_DEPTH_STENCIL_DESC {
                    DepthEnable: true.into(),
                    DepthWriteMask: D3D12_DEPTH_WRITE_MASK_ALL,
                    DepthFunc: D3D12_COMPARISON_FUNC_LESS_EQUAL,
                    ..Default::default()
                },
                InputLayout: D3D12_INPUT_LAYOUT_DESC {
                    pInputElementDescs: info.input_layout.as_ptr(),
                    NumElements: info.input_layout.len() as u32,
                },
                PrimitiveTopologyType: info.topology,
                NumRenderTargets: 1,
                DSVFormat: DEPTH_FORMAT,
                SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                ..Default::default()
            };
            desc.RTVFormats[0] = SURFACE_FORMAT;

            let pso = self.device.CreateGraphicsPipelineState(&desc)?;
            Ok(pso)
        }
    }

    pub fn create_compute_pipeline(
        &self,
        root_signature: &ID3D12RootSignature,
        cs: &Shader,
    ) -> Result<ID3D12PipelineState, Error> {
        unsafe {
            let desc = D3D12_COMPUTE_PIPELINE_STATE_DESC {
                pRootSignature: ManuallyDrop::new(Some(root_signature.clone())),
                CS: cs.bytecode(),
                ..Default::default()
            };
            let pso = self.device.CreateComputePipelineState(&desc)?;
            Ok(pso)
        }
    }

    pub fn execute(&self, cmd: &CmdBuf) {
        unsafe {
            let lists = [Some(ID3D12CommandList::from(&cmd.command_list))];
            self.command_queue.ExecuteCommandLists(&lists);
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if !self.upload_fence_event.is_invalid() {
                let _ = CloseHandle(self.upload_fence_event);
            }
        }
    }
}

/// Information to create a swap chain.
pub struct SwapChainInfo {
    pub num_buffers: u32,
    /// present sync interval, 0 disables vsync
    pub vsync: u32,
}

impl Default for SwapChainInfo {
    fn default() -> Self {
        SwapChainInfo {
            num_buffers: 2,
            vsync: 1,
        }
    }
}

/// N buffered swap chain with a default depth buffer; pacing between the cpu
/// and gpu happens here through one fence value per frame in flight.
pub struct SwapChain {
    num_buffers: u32,
    vsync: u32,
    width: i32,
    height: i32,
    frame_index: usize,
    swap_chain: IDXGISwapChain3,
    render_targets: Vec<ID3D12Resource>,
    rtv_handles: Vec<DescriptorHandle>,
    depth_buffer: ID3D12Resource,
    dsv_handle: DescriptorHandle,
    fence: ID3D12Fence,
    fence_event: HANDLE,
    fence_last_value: u64,
    fence_values: Vec<u64>,
}

fn create_depth_buffer(
    device: &ID3D12Device,
    width: u64,
    height: u32,
    handle: DescriptorHandle,
) -> Result<ID3D12Resource, Error> {
    unsafe {
        let clear_value = D3D12_CLEAR_VALUE {
            Format: DEPTH_FORMAT,
            Anonymous: D3D12_CLEAR_VALUE_0 {
                DepthStencil: D3D12_DEPTH_STENCIL_VALUE { Depth: 1.0, Stencil: 0 },
            },
        };
        let mut resource: Option<ID3D12Resource> = None;
        device.CreateCommittedResource(
            &D3D12_HEAP_PROPERTIES {
                Type: D3D12_HEAP_TYPE_DEFAULT,
                ..Default::default()
            },
            D3D12_HEAP_FLAG_NONE,
            &D3D12_RESOURCE_DESC {
                Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
                Width: width,
                Height: height,
                DepthOrArraySize: 1,
                MipLevels: 1,
                Format: DEPTH_FORMAT,
                SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                Flags: D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
                ..Default::default()
            },
            D3D12_RESOURCE_STATE_DEPTH_WRITE,
            Some(&clear_value),
            &mut resource,
        )?;
        let resource = resource.ok_or_else(|| Error {
            msg: String::from("dx12_samples::gfx:: failed to create depth buffer"),
        })?;
        device.CreateDepthStencilView(&resource, None, handle.cpu);
        Ok(resource)
    }
}

impl SwapChain {
    /// Handles window resizes then waits on the fence for the incoming frame
    /// slot, so its command allocator is safe to reuse.
    pub fn update(&mut self, device: &mut Device, window: &Window) -> Result<(), Error> {
        let (width, height) = window.get_size();
        if (width != self.width || height != self.height) && width > 0 && height > 0 {
            unsafe {
                self.wait_for_last_frame(device);

                // release backbuffer references before resizing
                self.render_targets.clear();
                self.swap_chain.ResizeBuffers(
                    self.num_buffers,
                    width as u32,
                    height as u32,
                    DXGI_FORMAT_UNKNOWN,
                    DXGI_SWAP_CHAIN_FLAG(0),
                )?;

                // recreate views over the existing descriptor slots
                for i in 0..self.num_buffers {
                    let render_target: ID3D12Resource = self.swap_chain.GetBuffer(i)?;
                    device
                        .device
                        .CreateRenderTargetView(&render_target, None, self.rtv_handles[i as usize].cpu);
                    self.render_targets.push(render_target);
                }
                self.depth_buffer =
                    create_depth_buffer(&device.device, width as u64, height as u32, self.dsv_handle)?;

                self.width = width;
                self.height = height;
                for value in &mut self.fence_values {
                    *value = 0;
                }
            }
        }
        self.new_frame();
        Ok(())
    }

    fn new_frame(&mut self) {
        unsafe {
            let bb = self.swap_chain.GetCurrentBackBufferIndex() as usize;
            let fence_value = self.fence_values[bb];
            if self.fence.GetCompletedValue() < fence_value {
                self.fence
                    .SetEventOnCompletion(fence_value, self.fence_event)
                    .expect("dx12_samples::gfx:: failed to set fence completion event");
                WaitForSingleObject(self.fence_event, INFINITE);
            }
            self.frame_index = bb;
        }
    }

    pub fn get_frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn get_num_buffers(&self) -> u32 {
        self.num_buffers
    }

    pub fn get_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn get_backbuffer_resource(&self) -> &ID3D12Resource {
        &self.render_targets[self.frame_index]
    }

    pub fn get_backbuffer_rtv(&self) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        self.rtv_handles[self.frame_index].cpu
    }

    pub fn get_depth_stencil_view(&self) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        self.dsv_handle.cpu
    }

    /// Presents and signals the fence for the frame just submitted.
    pub fn swap(&mut self, device: &Device) -> Result<(), Error> {
        unsafe {
            self.swap_chain.Present(self.vsync, DXGI_PRESENT(0)).ok()?;
            self.fence_last_value += 1;
            device.command_queue.Signal(&self.fence, self.fence_last_value)?;
            self.fence_values[self.frame_index] = self.fence_last_value;
            Ok(())
        }
    }

    /// Blocks until the gpu has drained every in flight frame; call before
    /// releasing resources the gpu may still reference.
    pub fn wait_for_last_frame(&mut self, device: &Device) {
        unsafe {
            for i in 0..self.num_buffers as usize {
                self.fence_last_value += 1;
                let fence_value = self.fence_last_value;
                if device.command_queue.Signal(&self.fence, fence_value).is_ok()
                    && self.fence.GetCompletedValue() < fence_value
                {
                    self.fence
                        .SetEventOnCompletion(fence_value, self.fence_event)
                        .expect("dx12_samples::gfx:: failed to set fence completion event");
                    WaitForSingleObject(self.fence_event, INFINITE);
                }
                self.fence_values[i] = 0;
            }
        }
    }
}

impl Drop for SwapChain {
    fn drop(&mut self) {
        unsafe {
            if !self.fence_event.is_invalid() {
                let _ = CloseHandle(self.fence_event);
            }
        }
    }
}

/// One command allocator per frame in flight and a single command list,
/// recorded fresh each frame.
pub struct CmdBuf {
    command_allocators: Vec<ID3D12CommandAllocator>,
    command_list: ID3D12GraphicsCommandList,
}

impl CmdBuf {
    /// Resets the incoming frame's allocator and opens the list for recording.
    pub fn reset(&mut self, swap_chain: &SwapChain) -> Result<(), Error> {
        let bb = swap_chain.get_frame_index();
        unsafe {
            self.command_allocators[bb].Reset()?;
            self.command_list.Reset(&self.command_allocators[bb], None)?;
        }
        Ok(())
    }

    pub fn close(&self) -> Result<(), Error> {
        unsafe {
            self.command_list.Close()?;
        }
        Ok(())
    }

    /// The native list, for recording draw and dispatch calls directly.
    pub fn cmd(&self) -> &ID3D12GraphicsCommandList {
        &self.command_list
    }

    pub fn transition_barrier(
        &self,
        resource: &ID3D12Resource,
        state_before: D3D12_RESOURCE_STATES,
        state_after: D3D12_RESOURCE_STATES,
    ) {
        unsafe {
            let barriers = [transition_barrier(resource, state_before, state_after)];
            self.command_list.ResourceBarrier(&barriers);
            release_barriers(barriers);
        }
    }
}

fn transition_barrier(
    resource: &ID3D12Resource,
    state_before: D3D12_RESOURCE_STATES,
    state_after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: ManuallyDrop::new(Some(resource.clone())),
                StateBefore: state_before,
                StateAfter: state_after,
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
            }),
        },
    }
}

// drops the resource references cloned into transition barriers
fn release_barriers<const N: usize>(barriers: [D3D12_RESOURCE_BARRIER; N]) {
    for barrier in barriers {
        unsafe {
            let _: D3D12_RESOURCE_TRANSITION_BARRIER = ManuallyDrop::into_inner(barrier.Anonymous.Transition);
        }
    }
}

/// Vertex and index buffers in gpu local memory with their views.
pub struct Mesh {
    #[allow(dead_code)]
    vb: ID3D12Resource,
    #[allow(dead_code)]
    ib: ID3D12Resource,
    pub vbv: D3D12_VERTEX_BUFFER_VIEW,
    pub ibv: D3D12_INDEX_BUFFER_VIEW,
    pub num_indices: u32,
}

/// Upload heap constant buffer with one copy per frame in flight, persistently
/// mapped so per frame updates are a plain memcpy.
pub struct ConstantBuffer<T: Sized> {
    buffers: Vec<ID3D12Resource>,
    mapped: Vec<*mut u8>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Sized> ConstantBuffer<T> {
    pub fn update(&mut self, frame: usize, data: &T) {
        unsafe {
            std::ptr::copy_nonoverlapping(
                data as *const T as *const u8,
                self.mapped[frame],
                std::mem::size_of::<T>(),
            );
        }
    }

    pub fn gpu_virtual_address(&self, frame: usize) -> u64 {
        unsafe { self.buffers[frame].GetGPUVirtualAddress() }
    }

    pub fn num_buffers(&self) -> usize {
        self.buffers.len()
    }
}

bitflags! {
    /// How a texture will be bound over its lifetime.
    pub struct TextureUsage: u32 {
        const SHADER_RESOURCE = 1 << 0;
        const RENDER_TARGET = 1 << 1;
        const DEPTH_STENCIL = 1 << 2;
        const UNORDERED_ACCESS = 1 << 3;
    }
}

#[derive(PartialEq, Eq, Clone, Copy)]
pub enum TextureType {
    Texture2D,
    TextureCube,
}

/// Information to create a texture.
pub struct TextureInfo {
    pub tex_type: TextureType,
    pub width: u64,
    pub height: u64,
    pub array_layers: u32,
    pub mip_levels: u32,
    pub format: DXGI_FORMAT,
    pub usage: TextureUsage,
}

impl TextureInfo {
    /// Texture info for a plain shader resource matching a decoded image.
    pub fn shader_resource_from_image(info: &crate::image::ImageInfo) -> TextureInfo {
        TextureInfo {
            tex_type: if info.cubemap {
                TextureType::TextureCube
            } else {
                TextureType::Texture2D
            },
            width: info.width,
            height: info.height,
            array_layers: info.array_layers,
            mip_levels: info.mip_levels,
            format: SURFACE_FORMAT,
            usage: TextureUsage::SHADER_RESOURCE,
        }
    }
}

/// A texture resource and whichever views its usage asked for.
pub struct Texture {
    resource: ID3D12Resource,
    srv: Option<DescriptorHandle>,
    uav: Option<DescriptorHandle>,
    rtv: Option<DescriptorHandle>,
    dsv: Option<DescriptorHandle>,
    face_rtvs: Vec<DescriptorHandle>,
    face_dsvs: Vec<DescriptorHandle>,
}

impl Texture {
    pub fn get_resource(&self) -> &ID3D12Resource {
        &self.resource
    }

    pub fn get_srv(&self) -> DescriptorHandle {
        self.srv.expect("dx12_samples::gfx:: texture was created without SHADER_RESOURCE usage")
    }

    pub fn get_uav(&self) -> DescriptorHandle {
        self.uav.expect("dx12_samples::gfx:: texture was created without UNORDERED_ACCESS usage")
    }

    pub fn get_rtv(&self) -> DescriptorHandle {
        self.rtv.expect("dx12_samples::gfx:: texture was created without RENDER_TARGET usage")
    }

    pub fn get_dsv(&self) -> DescriptorHandle {
        self.dsv.expect("dx12_samples::gfx:: texture was created without DEPTH_STENCIL usage")
    }

    pub fn get_face_rtv(&self, face: usize) -> DescriptorHandle {
        self.face_rtvs[face]
    }

    pub fn get_face_dsv(&self, face: usize) -> DescriptorHandle {
        self.face_dsvs[face]
    }
}

/// Image data copied back from the gpu, rows padded to `row_pitch`.
pub struct ReadBackData {
    pub data: Vec<u8>,
    pub row_pitch: u32,
    pub width: u32,
    pub height: u32,
}

/// Root signature parameters, in root parameter index order.
pub enum RootParam {
    /// root constant buffer view at register bN
    Cbv { register: u32 },
    /// single srv descriptor table at register tN
    Srv { register: u32 },
    /// single uav descriptor table at register uN
    Uav { register: u32 },
}

#[derive(Clone, Copy)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Geometry,
    Hull,
    Domain,
    Compute,
}

fn shader_target(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vs_5_0",
        ShaderStage::Pixel => "ps_5_0",
        ShaderStage::Geometry => "gs_5_0",
        ShaderStage::Hull => "hs_5_0",
        ShaderStage::Domain => "ds_5_0",
        ShaderStage::Compute => "cs_5_0",
    }
}

/// Compiled shader bytecode.
pub struct Shader {
    blob: ID3DBlob,
}

impl Shader {
    /// Loads hlsl source from disk by file name and compiles it with fxc.
    pub fn compile_from_file(filename: &str, stage: ShaderStage, entry_point: &str) -> Result<Shader, Error> {
        let source = std::fs::read_to_string(filename).map_err(|e| Error {
            msg: format!("dx12_samples::gfx:: failed to read shader {}: {}", filename, e),
        })?;
        Shader::compile(&source, stage, entry_point).map_err(|e| Error {
            msg: format!("{} ({})", e.msg, filename),
        })
    }

    pub fn compile(source: &str, stage: ShaderStage, entry_point: &str) -> Result<Shader, Error> {
        unsafe {
            let compile_flags = if cfg!(debug_assertions) {
                D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
            } else {
                D3DCOMPILE_OPTIMIZATION_LEVEL3
            };

            let entry = CString::new(entry_point).unwrap();
            let target = CString::new(shader_target(stage)).unwrap();
            let mut blob = None;
            let mut error = None;

            let result = D3DCompile(
                source.as_ptr() as *const std::ffi::c_void,
                source.len(),
                None,
                None,
                None,
                PCSTR(entry.as_ptr() as *const u8),
                PCSTR(target.as_ptr() as *const u8),
                compile_flags,
                0,
                &mut blob,
                Some(&mut error),
            );

            if let Some(error) = error {
                let msg = std::slice::from_raw_parts(error.GetBufferPointer() as *const u8, error.GetBufferSize());
                return Err(Error {
                    msg: format!(
                        "dx12_samples::gfx:: shader compile failed: {}",
                        String::from_utf8_lossy(msg)
                    ),
                });
            }
            result?;
            let blob = blob.ok_or_else(|| Error {
                msg: String::from("dx12_samples::gfx:: shader compile returned no bytecode"),
            })?;
            Ok(Shader { blob })
        }
    }

    pub fn bytecode(&self) -> D3D12_SHADER_BYTECODE {
        unsafe {
            D3D12_SHADER_BYTECODE {
                pShaderBytecode: self.blob.GetBufferPointer(),
                BytecodeLength: self.blob.GetBufferSize(),
            }
        }
    }
}

/// Information to create a graphics pipeline on top of the shared defaults.
pub struct RenderPipelineInfo<'a> {
    pub vs: Option<&'a Shader>,
    pub ps: Option<&'a Shader>,
    pub gs: Option<&'a Shader>,
    pub hs: Option<&'a Shader>,
    pub ds: Option<&'a Shader>,
    pub input_layout: &'a [D3D12_INPUT_ELEMENT_DESC],
    pub root_signature: &'a ID3D12RootSignature,
    pub topology: D3D12_PRIMITIVE_TOPOLOGY_TYPE,
    pub cull_mode: D3D12_CULL_MODE,
    pub front_ccw: bool,
    pub wireframe: bool,
}

impl<'a> RenderPipelineInfo<'a> {
    /// vs + ps pipeline over triangles with no culling.
    pub fn new(
        root_signature: &'a ID3D12RootSignature,
        input_layout: &'a [D3D12_INPUT_ELEMENT_DESC],
        vs: &'a Shader,
        ps: &'a Shader,
    ) -> Self {
        RenderPipelineInfo {
            vs: Some(vs),
            ps: Some(ps),
            gs: None,
            hs: None,
            ds: None,
            input_layout,
            root_signature,
            topology: D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
            cull_mode: D3D12_CULL_MODE_NONE,
            front_ccw: false,
            wireframe: false,
        }
    }
}

/// POSITION, NORMAL input layout matching `primitives::Vertex3D`.
pub fn input_layout_position_normal() -> [D3D12_INPUT_ELEMENT_DESC; 2] {
    [
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: PCSTR(b"POSITION\0".as_ptr()),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32B32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: 0,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: PCSTR(b"NORMAL\0".as_ptr()),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32B32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: 12,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
    ]
}

/// POSITION, TEXCOORD input layout matching `primitives::VertexUV`.
pub fn input_layout_position_texcoord() -> [D3D12_INPUT_ELEMENT_DESC; 2] {
    [
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: PCSTR(b"POSITION\0".as_ptr()),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32B32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: 0,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: PCSTR(b"TEXCOORD\0".as_ptr()),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: 12,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
    ]
}

/// POSITION only input layout for patch control points.
pub fn input_layout_position() -> [D3D12_INPUT_ELEMENT_DESC; 1] {
    [D3D12_INPUT_ELEMENT_DESC {
        SemanticName: PCSTR(b"POSITION\0".as_ptr()),
        SemanticIndex: 0,
        Format: DXGI_FORMAT_R32G32B32_FLOAT,
        InputSlot: 0,
        AlignedByteOffset: 0,
        InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
        InstanceDataStepRate: 0,
    }]
}
