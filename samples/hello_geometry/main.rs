//! Geometry shader sample; draws a sphere flat shaded with face normals
//! recomputed per triangle in a geometry shader, or smooth shaded with the
//! vertex normals extruded as lines by a second geometry shader pass.
//!
//! Controls: `1` flat, `2` normal vectors, left drag rotate, right drag
//! dolly, middle drag pan, escape quit.

#[cfg(target_os = "windows")]
fn main() -> Result<(), dx12_samples::Error> {
    sample::run()
}

#[cfg(not(target_os = "windows"))]
fn main() {
    println!("hello_geometry requires windows and a d3d12 capable gpu");
}

#[cfg(target_os = "windows")]
mod sample {
    use dx12_samples::*;
    use maths_rs::prelude::*;
    use windows::Win32::Foundation::RECT;
    use windows::Win32::Graphics::Direct3D::*;
    use windows::Win32::Graphics::Direct3D12::*;

    #[repr(C)]
    struct SceneParameters {
        view: Mat4f,
        proj: Mat4f,
        light_dir: Vec4f,
    }

    #[derive(PartialEq, Clone, Copy)]
    enum DrawMode {
        Flat,
        NormalVector,
    }

    fn update_camera(app: &os::win32::App, camera: &mut camera::OrbitCamera) {
        let drag = app.get_mouse_delta();
        if app.is_mouse_down(os::MouseButton::Left) {
            camera.rotate(drag.x as f32, drag.y as f32);
        } else if app.is_mouse_down(os::MouseButton::Right) {
            camera.dolly(drag.y as f32 * 0.02);
        } else if app.is_mouse_down(os::MouseButton::Middle) {
            camera.pan(drag.x as f32 * 0.01, drag.y as f32 * 0.01);
        }
        camera.dolly(-app.get_mouse_wheel() * 0.5);
    }

    pub(super) fn run() -> Result<(), Error> {
        let config = SampleConfig::load();

        let app = os::win32::App::create(os::AppInfo {
            name: String::from("hello_geometry"),
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
            title: String::from("hello_geometry [flat]"),
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

        let mesh = primitives::create_sphere_mesh(&mut device, 24)?;
        let mut scene_cb = device.create_constant_buffer::<SceneParameters>(config.num_buffers as usize)?;

        let root_signature = device.create_root_signature(&[gfx::RootParam::Cbv { register: 0 }], false)?;
        let input_layout = gfx::input_layout_position_normal();

        let smooth_vs = gfx::Shader::compile_from_file(
            &get_data_path("shaders/default.hlsl"),
            gfx::ShaderStage::Vertex,
            "mainVS",
        )?;
        let smooth_ps = gfx::Shader::compile_from_file(
            &get_data_path("shaders/default.hlsl"),
            gfx::ShaderStage::Pixel,
            "mainPS",
        )?;
        let pso_smooth = device.create_render_pipeline(&gfx::RenderPipelineInfo {
            front_ccw: true,
            ..gfx::RenderPipelineInfo::new(&root_signature, &input_layout, &smooth_vs, &smooth_ps)
        })?;

        let flat_vs = gfx::Shader::compile_from_file(
            &get_data_path("shaders/flat.hlsl"),
            gfx::ShaderStage::Vertex,
            "mainVS",
        )?;
        let flat_gs = gfx::Shader::compile_from_file(
            &get_data_path("shaders/flat.hlsl"),
            gfx::ShaderStage::Geometry,
            "mainGS",
        )?;
        let flat_ps = gfx::Shader::compile_from_file(
            &get_data_path("shaders/flat.hlsl"),
            gfx::ShaderStage::Pixel,
            "mainPS",
        )?;
        let pso_flat = device.create_render_pipeline(&gfx::RenderPipelineInfo {
            gs: Some(&flat_gs),
            front_ccw: true,
            ..gfx::RenderPipelineInfo::new(&root_signature, &input_layout, &flat_vs, &flat_ps)
        })?;

        let normal_vs = gfx::Shader::compile_from_file(
            &get_data_path("shaders/draw_normals.hlsl"),
            gfx::ShaderStage::Vertex,
            "mainVS",
        )?;
        let normal_gs = gfx::Shader::compile_from_file(
            &get_data_path("shaders/draw_normals.hlsl"),
            gfx::ShaderStage::Geometry,
            "mainGS",
        )?;
        let normal_ps = gfx::Shader::compile_from_file(
            &get_data_path("shaders/draw_normals.hlsl"),
            gfx::ShaderStage::Pixel,
            "mainPS",
        )?;
        let pso_normals = device.create_render_pipeline(&gfx::RenderPipelineInfo {
            gs: Some(&normal_gs),
            front_ccw: true,
            ..gfx::RenderPipelineInfo::new(&root_signature, &input_layout, &normal_vs, &normal_ps)
        })?;

        let mut camera = camera::OrbitCamera::new(Vec3f::zero(), vec2f(-30.0, 30.0), 5.0);
        let mut mode = DrawMode::Flat;

        while app.run() {
            if app.is_key_pressed(os::Key::Escape) {
                break;
            }
            if app.is_key_pressed(os::Key::Num1) {
                mode = DrawMode::Flat;
                window.set_title("hello_geometry [flat]");
            }
            if app.is_key_pressed(os::Key::Num2) {
                mode = DrawMode::NormalVector;
                window.set_title("hello_geometry [normal vectors]");
            }
            update_camera(&app, &mut camera);

            window.update();
            swap_chain.update(&mut device, &window)?;
            cmd.reset(&swap_chain)?;

            let frame = swap_chain.get_frame_index();
            let (width, height) = swap_chain.get_size();
            let aspect = width as f32 / height as f32;
            scene_cb.update(
                frame,
                &SceneParameters {
                    view: camera.get_view_matrix().transpose(),
                    proj: camera::create_perspective_projection_lh_yup(f32::deg_to_rad(45.0), aspect, 0.1, 100.0)
                        .transpose(),
                    light_dir: vec4f(0.5, 1.0, 0.5, 0.0),
                },
            );

            cmd.transition_barrier(
                swap_chain.get_backbuffer_resource(),
                D3D12_RESOURCE_STATE_PRESENT,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
            );

            unsafe {
                let list = cmd.cmd();
                let rtv = swap_chain.get_backbuffer_rtv();
                let dsv = swap_chain.get_depth_stencil_view();
                let clear_colour = [0.5f32, 0.75, 1.0, 1.0];
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

                list.SetDescriptorHeaps(&[Some(device.get_shader_heap().get_heap().clone())]);
                list.SetGraphicsRootSignature(&root_signature);
                list.SetGraphicsRootConstantBufferView(0, scene_cb.gpu_virtual_address(frame));

                list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
                list.IASetVertexBuffers(0, Some(&[mesh.vbv]));
                list.IASetIndexBuffer(Some(&mesh.ibv));

                match mode {
                    DrawMode::Flat => {
                        list.SetPipelineState(&pso_flat);
                        list.DrawIndexedInstanced(mesh.num_indices, 1, 0, 0, 0);
                    }
                    DrawMode::NormalVector => {
                        list.SetPipelineState(&pso_smooth);
                        list.DrawIndexedInstanced(mesh.num_indices, 1, 0, 0, 0);
                        list.SetPipelineState(&pso_normals);
                        list.DrawIndexedInstanced(mesh.num_indices, 1, 0, 0, 0);
                    }
                }
            }

            cmd.transition_barrier(
                swap_chain.get_backbuffer_resource(),
                D3D12_RESOURCE_STATE_RENDER_TARGET,
                D3D12_RESOURCE_STATE_PRESENT,
            );
            cmd.close()?;

            device.execute(&cmd);
            swap_chain.swap(&device)?;
        }

        // must wait for the final frame to be completed
        swap_chain.wait_for_last_frame(&device);

        Ok(())
    }
}
