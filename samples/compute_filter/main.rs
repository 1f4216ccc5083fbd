//! Compute shader image filter; a source texture is filtered into a uav
//! texture by a compute pass (sepia or sobel kernels) and both images are
//! drawn side by side on ortho projected quads.
//!
//! Controls: `1` sepia, `2` sobel, `s` write the filtered image to
//! `filtered.png`, escape quit.

#[cfg(target_os = "windows")]
fn main() -> Result<(), dx12_samples::Error> {
    sample::run()
}

#[cfg(not(target_os = "windows"))]
fn main() {
    println!("compute_filter requires windows and a d3d12 capable gpu");
}

#[cfg(target_os = "windows")]
mod sample {
    use dx12_samples::*;
    use maths_rs::prelude::*;
    use windows::Win32::Foundation::RECT;
    use windows::Win32::Graphics::Direct3D::*;
    use windows::Win32::Graphics::Direct3D12::*;

    #[repr(C)]
    struct BlitParameters {
        proj: Mat4f,
    }

    #[derive(PartialEq, Clone, Copy)]
    enum Filter {
        Sepia,
        Sobel,
    }

    pub(super) fn run() -> Result<(), Error> {
        let config = SampleConfig::load();

        let app = os::win32::App::create(os::AppInfo {
            name: String::from("compute_filter"),
            dpi_aware: true,
        });

        let mut device = gfx::Device::create(&gfx::DeviceInfo {
            adapter_name: config.adapter_name.clone(),
            shader_heap_size: config.shader_heap_size,
            render_target_heap_size: config.render_target_heap_size,
            depth_stencil_heap_size: config.depth_stencil_heap_size,
        })?;
        println!("{}", device.get_adapter_info());

        let mut window = app.create_window(os::WindowInfo {
            title: String::from("compute_filter [sepia]"),
            rect: config.window_rect,
            style: os::WindowStyleFlags::VISIBLE,
        });

        let mut swap_chain = device.create_swap_chain(
            &gfx::SwapChainInfo {
                num_buffers: config.num_buffers,
                vsync: config.vsync,
            },
            &window,
        )?;
        let mut cmd = device.create_cmd_buf(config.num_buffers)?;

        let source_image = image::load_from_file(&get_data_path("textures/test_pattern.png"))?;
        let (filter_width, filter_height) = (source_image.info.width, source_image.info.height);
        let source = device.create_texture(
            &gfx::TextureInfo::shader_resource_from_image(&source_image.info),
            Some(&source_image.data),
        )?;

        let filtered = device.create_texture(
            &gfx::TextureInfo {
                tex_type: gfx::TextureType::Texture2D,
                width: filter_width,
                height: filter_height,
                array_layers: 1,
                mip_levels: 1,
                format: gfx::SURFACE_FORMAT,
                usage: gfx::TextureUsage::SHADER_RESOURCE | gfx::TextureUsage::UNORDERED_ACCESS,
            },
            None,
        )?;

        // two quads side by side in a fixed 1280x720 ortho space
        let quad_src = primitives::create_screen_quad_mesh(&mut device, vec2f(-300.0, 0.0), 280.0, 280.0)?;
        let quad_dst = primitives::create_screen_quad_mesh(&mut device, vec2f(300.0, 0.0), 280.0, 280.0)?;
        let mut blit_cb = device.create_constant_buffer::<BlitParameters>(config.num_buffers as usize)?;

        let rs_compute = device.create_root_signature(
            &[gfx::RootParam::Srv { register: 0 }, gfx::RootParam::Uav { register: 0 }],
            false,
        )?;
        let rs_blit = device.create_root_signature(
            &[gfx::RootParam::Cbv { register: 0 }, gfx::RootParam::Srv { register: 0 }],
            true,
        )?;

        let cs_path = get_data_path("shaders/compute_filter.hlsl");
        let sepia_cs = gfx::Shader::compile_from_file(&cs_path, gfx::ShaderStage::Compute, "mainSepia")?;
        let sobel_cs = gfx::Shader::compile_from_file(&cs_path, gfx::ShaderStage::Compute, "mainSobel")?;
        let pso_sepia = device.create_compute_pipeline(&rs_compute, &sepia_cs)?;
        let pso_sobel = device.create_compute_pipeline(&rs_compute, &sobel_cs)?;

        let input_layout = gfx::input_layout_position_texcoord();
        let blit_path = get_data_path("shaders/blit.hlsl");
        let blit_vs = gfx::Shader::compile_from_file(&blit_path, gfx::ShaderStage::Vertex, "mainVS")?;
        let blit_ps = gfx::Shader::compile_from_file(&blit_path, gfx::ShaderStage::Pixel, "mainPS")?;
        let pso_blit = device.create_render_pipeline(&gfx::RenderPipelineInfo::new(
            &rs_blit,
            &input_layout,
            &blit_vs,
            &blit_ps,
        ))?;

        let mut filter = Filter::Sepia;

        while app.run() {
            if app.is_key_pressed(os::Key::Escape) {
                break;
            }
            if app.is_key_pressed(os::Key::Num1) {
                filter = Filter::Sepia;
                window.set_title("compute_filter [sepia]");
            }
            if app.is_key_pressed(os::Key::Num2) {
                filter = Filter::Sobel;
                window.set_title("compute_filter [sobel]");
            }
            if app.is_key_pressed(os::Key::S) {
                // drain the gpu so the filtered image is complete before copying it back
                swap_chain.wait_for_last_frame(&device);
                let readback = device.read_back_texture(
                    &filtered,
                    filter_width,
                    filter_height,
                    D3D12_RESOURCE_STATE_UNORDERED_ACCESS,
                )?;
                image::write_to_file_from_gpu("filtered.png", &readback)?;
                println!("compute_filter:: written filtered.png");
            }

            window.update();
            swap_chain.update(&mut device, &window)?;
            cmd.reset(&swap_chain)?;

            let frame = swap_chain.get_frame_index();
            let (width, height) = swap_chain.get_size();
            blit_cb.update(
                frame,
                &BlitParameters {
                    proj: camera::create_ortho_matrix(-640.0, 640.0, -360.0, 360.0, -1.0, 1.0).transpose(),
                },
            );

            unsafe {
                let list = cmd.cmd();
                list.SetDescriptorHeaps(&[Some(device.get_shader_heap().get_heap().clone())]);

                // filter pass
                list.SetComputeRootSignature(&rs_compute);
                list.SetPipelineState(match filter {
                    Filter::Sepia => &pso_sepia,
                    Filter::Sobel => &pso_sobel,
                });
                list.SetComputeRootDescriptorTable(0, source.get_srv().gpu);
                list.SetComputeRootDescriptorTable(1, filtered.get_uav().gpu);
                let group_x = (filter_width as u32 + 15) / 16;
                let group_y = (filter_height as u32 + 15) / 16;
                list.Dispatch(group_x, group_y, 1);

                cmd.transition_barrier(
                    filtered.get_resource(),
                    D3D12_RESOURCE_STATE_UNORDERED_ACCESS,
                    D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
                );

                // draw both images
                cmd.transition_barrier(
                    swap_chain.get_backbuffer_resource(),
                    D3D12_RESOURCE_STATE_PRESENT,
                    D3D12_RESOURCE_STATE_RENDER_TARGET,
                );

                let rtv = swap_chain.get_backbuffer_rtv();
                let dsv = swap_chain.get_depth_stencil_view();
                let clear_colour = [0.1f32, 0.5, 0.75, 1.0];
                list.ClearRenderTargetView(rtv, &clear_colour, None);
                list.ClearDepthStencilView(dsv, D3D12_CLEAR_FLAG_DEPTH, 1.0, 0, None);
                list.OMSetRenderTargets(1, Some(&rtv), false, Some(&dsv));
                list.RSSetViewports(&[D3D12_VIEWPORT {
                    Width: width as f32,
                    Height: height as f32,
                    MaxDepth: 1.0,
                    ..Default::default()
                }]);
                list.RSSetScissorRects(&[RECT {
                    right: width,
                    bottom: height,
                    ..Default::default()
                }]);

                list.SetGraphicsRootSignature(&rs_blit);
                list.SetPipelineState(&pso_blit);
                list.SetGraphicsRootConstantBufferView(0, blit_cb.gpu_virtual_address(frame));
                list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP);

                list.SetGraphicsRootDescriptorTable(1, source.get_srv().gpu);
                list.IASetVertexBuffers(0, Some(&[quad_src.vbv]));
                list.IASetIndexBuffer(Some(&quad_src.ibv));
                list.DrawIndexedInstanced(quad_src.num_indices, 1, 0, 0, 0);

                list.SetGraphicsRootDescriptorTable(1, filtered.get_srv().gpu);
                list.IASetVertexBuffers(0, Some(&[quad_dst.vbv]));
                list.IASetIndexBuffer(Some(&quad_dst.ibv));
                list.DrawIndexedInstanced(quad_dst.num_indices, 1, 0, 0, 0);

                cmd.transition_barrier(
                    swap_chain.get_backbuffer_resource(),
                    D3D12_RESOURCE_STATE_RENDER_TARGET,
                    D3D12_RESOURCE_STATE_PRESENT,
                );
                cmd.transition_barrier(
                    filtered.get_resource(),
                    D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
                    D3D12_RESOURCE_STATE_UNORDERED_ACCESS,
                );
            }

            cmd.close()?;
            device.execute(&cmd);
            swap_chain.swap(&device)?;
        }

        // must wait for the final frame to be completed
        swap_chain.wait_for_last_frame(&device);

        Ok(())
    }
}
