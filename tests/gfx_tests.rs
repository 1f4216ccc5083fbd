// currently windows only because here we need a concrete gfx and os implementation
#![cfg(target_os = "windows")]

use dx12_samples::*;

use windows::Win32::Graphics::Direct3D12::*;

fn create_test_device(shader_heap_size: usize) -> gfx::Device {
    gfx::Device::create(&gfx::DeviceInfo {
        adapter_name: None,
        shader_heap_size,
        render_target_heap_size: 16,
        depth_stencil_heap_size: 16,
    })
    .unwrap()
}

#[test]
fn create_d3d12_device() {
    let device = create_test_device(8);
    assert!(!device.get_adapter_info().is_empty());
}

#[test]
fn unknown_adapter_falls_back_to_primary() {
    let device = gfx::Device::create(&gfx::DeviceInfo {
        adapter_name: Some(String::from("definitely not a real adapter name")),
        shader_heap_size: 1,
        render_target_heap_size: 1,
        depth_stencil_heap_size: 1,
    })
    .unwrap();
    assert!(!device.get_adapter_info().is_empty());
}

#[test]
fn create_mesh_views() {
    let mut device = create_test_device(8);
    let mesh = primitives::create_sphere_mesh(&mut device, 8).unwrap();
    assert_eq!(mesh.num_indices, 8 * 8 * 6);
    assert_eq!(mesh.vbv.StrideInBytes as usize, std::mem::size_of::<primitives::Vertex3D>());
    assert_eq!(mesh.ibv.SizeInBytes, mesh.num_indices * 4);
}

#[test]
fn constant_buffers_are_per_frame_and_aligned() {
    #[repr(C)]
    struct Params {
        values: [f32; 4],
    }
    let mut device = create_test_device(8);
    let mut cb = device.create_constant_buffer::<Params>(2).unwrap();
    cb.update(0, &Params { values: [1.0; 4] });
    cb.update(1, &Params { values: [2.0; 4] });
    assert_eq!(cb.num_buffers(), 2);
    let a0 = cb.gpu_virtual_address(0);
    let a1 = cb.gpu_virtual_address(1);
    assert_ne!(a0, a1);
    assert_eq!(a0 % 256, 0);
    assert_eq!(a1 % 256, 0);
}

#[test]
fn shader_heap_exhaustion_is_an_error() {
    let mut device = create_test_device(2);
    let info = gfx::TextureInfo {
        tex_type: gfx::TextureType::Texture2D,
        width: 4,
        height: 4,
        array_layers: 1,
        mip_levels: 1,
        format: gfx::SURFACE_FORMAT,
        usage: gfx::TextureUsage::SHADER_RESOURCE,
    };
    assert!(device.create_texture(&info, None).is_ok());
    assert!(device.create_texture(&info, None).is_ok());
    let overflow = device.create_texture(&info, None);
    assert!(overflow.is_err());
    assert!(overflow.err().unwrap().msg.contains("exhausted"));
}

#[test]
fn texture_upload_and_read_back_round_trip() {
    let mut device = create_test_device(8);
    let width = 17u64; // deliberately not a multiple of the row pitch alignment
    let height = 5u64;
    let mut data = Vec::new();
    for i in 0..width * height {
        data.extend_from_slice(&[(i & 0xff) as u8, ((i >> 8) & 0xff) as u8, 0xab, 0xff]);
    }
    let texture = device
        .create_texture(
            &gfx::TextureInfo {
                tex_type: gfx::TextureType::Texture2D,
                width,
                height,
                array_layers: 1,
                mip_levels: 1,
                format: gfx::SURFACE_FORMAT,
                usage: gfx::TextureUsage::SHADER_RESOURCE,
            },
            Some(&data),
        )
        .unwrap();

    let readback = device
        .read_back_texture(&texture, width, height, D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE)
        .unwrap();
    assert_eq!(readback.width as u64, width);
    assert_eq!(readback.height as u64, height);
    assert_eq!(readback.row_pitch % 256, 0);
    for row in 0..height {
        let src = (row * width * 4) as usize;
        let dst = (row * readback.row_pitch as u64) as usize;
        assert_eq!(&readback.data[dst..dst + (width * 4) as usize], &data[src..src + (width * 4) as usize]);
    }
}

#[test]
fn cubemap_render_target_has_per_face_views() {
    let mut device = create_test_device(8);
    let cubemap = device
        .create_texture(
            &gfx::TextureInfo {
                tex_type: gfx::TextureType::TextureCube,
                width: 64,
                height: 64,
                array_layers: 6,
                mip_levels: 1,
                format: gfx::SURFACE_FORMAT,
                usage: gfx::TextureUsage::SHADER_RESOURCE | gfx::TextureUsage::RENDER_TARGET,
            },
            None,
        )
        .unwrap();
    // whole array view plus one per face
    let _ = cubemap.get_rtv();
    for face in 0..6 {
        let handle = cubemap.get_face_rtv(face);
        assert!(handle.cpu.ptr != 0);
    }
    assert!(cubemap.get_srv().gpu.ptr != 0);
}

#[test]
fn shader_compile_reports_errors() {
    let good = gfx::Shader::compile(
        "float4 mainPS() : SV_TARGET { return float4(1.0, 0.0, 0.0, 1.0); }",
        gfx::ShaderStage::Pixel,
        "mainPS",
    );
    assert!(good.is_ok());

    let bad = gfx::Shader::compile("this is not hlsl", gfx::ShaderStage::Pixel, "mainPS");
    assert!(bad.is_err());
    assert!(bad.err().unwrap().msg.contains("shader compile failed"));
}

#[test]
fn render_pipeline_from_compiled_shaders() {
    let device = create_test_device(8);
    let root_signature = device
        .create_root_signature(&[gfx::RootParam::Cbv { register: 0 }], false)
        .unwrap();
    let vs = gfx::Shader::compile(
        r#"
        cbuffer SceneParameters : register(b0) { float4x4 mvp; }
        float4 mainVS(float3 position : POSITION, float3 normal : NORMAL) : SV_POSITION
        {
            return mul(mvp, float4(position, 1.0));
        }
        "#,
        gfx::ShaderStage::Vertex,
        "mainVS",
    )
    .unwrap();
    let ps = gfx::Shader::compile(
        "float4 mainPS() : SV_TARGET { return float4(0.0, 1.0, 0.0, 1.0); }",
        gfx::ShaderStage::Pixel,
        "mainPS",
    )
    .unwrap();
    let input_layout = gfx::input_layout_position_normal();
    let pso = device.create_render_pipeline(&gfx::RenderPipelineInfo::new(
        &root_signature,
        &input_layout,
        &vs,
        &ps,
    ));
    assert!(pso.is_ok());
}

#[test]
fn swap_chain_clear_loop() {
    let app = os::win32::App::create(os::AppInfo {
        name: String::from("swap_chain_clear_loop"),
        dpi_aware: true,
    });
    let mut device = create_test_device(8);
    let mut window = app.create_window(os::WindowInfo {
        title: String::from("swap chain buffering"),
        rect: os::Rect {
            x: 0,
            y: 0,
            width: 640,
            height: 360,
        },
        style: os::WindowStyleFlags::VISIBLE,
    });

    let mut swap_chain = device
        .create_swap_chain(&gfx::SwapChainInfo { num_buffers: 2, vsync: 0 }, &window)
        .unwrap();
    let mut cmd = device.create_cmd_buf(2).unwrap();

    let clear_colours: [[f32; 4]; 4] = [
        [1.0, 0.0, 1.0, 1.0],
        [1.0, 1.0, 0.0, 1.0],
        [0.0, 1.0, 1.0, 1.0],
        [0.0, 1.0, 0.0, 1.0],
    ];

    let mut i = 0;
    while app.run() && i < 16 {
        window.update();
        swap_chain.update(&mut device, &window).unwrap();
        cmd.reset(&swap_chain).unwrap();

        cmd.transition_barrier(
            swap_chain.get_backbuffer_resource(),
            D3D12_RESOURCE_STATE_PRESENT,
            D3D12_RESOURCE_STATE_RENDER_TARGET,
        );
        unsafe {
            cmd.cmd().ClearRenderTargetView(
                swap_chain.get_backbuffer_rtv(),
                &clear_colours[i % clear_colours.len()],
                None,
            );
        }
        cmd.transition_barrier(
            swap_chain.get_backbuffer_resource(),
            D3D12_RESOURCE_STATE_RENDER_TARGET,
            D3D12_RESOURCE_STATE_PRESENT,
        );
        cmd.close().unwrap();

        device.execute(&cmd);
        swap_chain.swap(&device).unwrap();
        i += 1;
    }

    swap_chain.wait_for_last_frame(&device);
    window.close();
}
