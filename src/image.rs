use stb_image_rust;
use stb_image_write_rust::ImageWriter::ImageWriter;

use std::fs;
use std::io::Read;

use ddsfile::Caps2;
use ddsfile::D3DFormat;
use ddsfile::Dds as DDS;
use ddsfile::DxgiFormat;

/// Dimensions and layout of decoded image data; all data is RGBA8.
#[derive(Clone, Copy)]
pub struct ImageInfo {
    pub width: u64,
    pub height: u64,
    pub array_layers: u32,
    pub mip_levels: u32,
    pub cubemap: bool,
}

/// Decoded image with an `ImageInfo` header and a `Vec<u8>` of tightly packed data.
pub struct ImageData {
    pub info: ImageInfo,
    pub data: Vec<u8>,
}

/// Loads an image from file returning information in the ImageData struct
/// supported formats are (png, tga, bmp, jpg, gif, dds)
pub fn load_from_file(filename: &str) -> Result<ImageData, super::Error> {
    let path = std::path::Path::new(filename);
    println!("dx12_samples::image:: loading: {}", path.display());
    let mut f = fs::File::open(path)?;
    if filename.ends_with(".dds") {
        let dds = DDS::read(&mut f)?;
        validate_dds_format(&dds, filename)?;
        Ok(ImageData {
            info: ImageInfo {
                width: dds.get_width() as u64,
                height: dds.get_height() as u64,
                array_layers: dds.get_num_array_layers(),
                mip_levels: dds.get_num_mipmap_levels(),
                cubemap: is_dds_cubemap(&dds),
            },
            data: dds.data.to_vec(),
        })
    } else {
        // stb image
        let mut contents = vec![];
        f.read_to_end(&mut contents)?;

        let mut x = 0;
        let mut y = 0;
        let mut comp = 0;
        let mut data_out: Vec<u8> = Vec::new();

        unsafe {
            let img = stb_image_rust::stbi_load_from_memory(
                contents.as_mut_ptr(),
                contents.len() as i32,
                &mut x,
                &mut y,
                &mut comp,
                stb_image_rust::STBI_rgb_alpha,
            );

            if !img.is_null() {
                let data_size_bytes = x * y * 4;
                data_out.resize(data_size_bytes as usize, 0);
                std::ptr::copy_nonoverlapping(img, data_out.as_mut_ptr(), data_size_bytes as usize);
                stb_image_rust::c_runtime::free(img);

                Ok(ImageData {
                    info: ImageInfo {
                        width: x as u64,
                        height: y as u64,
                        array_layers: 1,
                        mip_levels: 1,
                        cubemap: false,
                    },
                    data: data_out,
                })
            } else {
                Err(super::Error {
                    msg: format!(
                        "dx12_samples::image:: failed to load image via stb_image: {}",
                        filename
                    ),
                })
            }
        }
    }
}

// the samples consume everything as rgba8, other dds formats are rejected up front
fn validate_dds_format(dds: &DDS, filename: &str) -> Result<(), super::Error> {
    let supported = match dds.get_d3d_format() {
        Some(D3DFormat::A8B8G8R8) => true,
        Some(_) => false,
        None => matches!(dds.get_dxgi_format(), Some(DxgiFormat::R8G8B8A8_UNorm)),
    };
    if supported {
        Ok(())
    } else {
        Err(super::Error {
            msg: format!(
                "dx12_samples::image:: unsupported dds format, expected rgba8: {}",
                filename
            ),
        })
    }
}

fn is_dds_cubemap(dds: &DDS) -> bool {
    let all_faces = Caps2::CUBEMAP_POSITIVEX
        | Caps2::CUBEMAP_NEGATIVEX
        | Caps2::CUBEMAP_POSITIVEY
        | Caps2::CUBEMAP_NEGATIVEY
        | Caps2::CUBEMAP_POSITIVEZ
        | Caps2::CUBEMAP_NEGATIVEZ;
    dds.header.caps2.contains(Caps2::CUBEMAP) && dds.header.caps2.contains(all_faces)
}

/// Writes a buffer of image data to a file. The type of image format written is determined by filename ext
/// supported image formats are (png, bmp, tga and jpg).
pub fn write_to_file(
    filename: &str,
    width: u64,
    height: u64,
    components: u32,
    image_data: &[u8],
) -> Result<(), super::Error> {
    let path = std::path::Path::new(&filename);
    let mut writer = ImageWriter::new(filename);
    match path.extension() {
        Some(os_str) => match os_str.to_str() {
            Some("png") => {
                writer.write_png(width as i32, height as i32, components as i32, image_data.as_ptr());
                Ok(())
            }
            Some("bmp") => {
                writer.write_bmp(width as i32, height as i32, components as i32, image_data.as_ptr());
                Ok(())
            }
            Some("tga") => {
                writer.write_tga(width as i32, height as i32, components as i32, image_data.as_ptr());
                Ok(())
            }
            Some("jpg") => {
                writer.write_jpg(width as i32, height as i32, components as i32, image_data.as_ptr(), 90);
                Ok(())
            }
            _ => Err(super::Error {
                msg: format!(
                    "dx12_samples::image:: image format '{}' is not supported",
                    os_str.to_str().unwrap_or("")
                ),
            }),
        },
        _ => Err(super::Error {
            msg: format!("dx12_samples::image:: filename '{}' has no extension!", filename),
        }),
    }
}

/// Writes an image file from data read back from the GPU, stripping row alignment padding.
#[cfg(target_os = "windows")]
pub fn write_to_file_from_gpu(filename: &str, data: &crate::gfx::ReadBackData) -> Result<(), super::Error> {
    let width = data.width;
    let height = data.height;
    let tight_pitch = width * 4;
    let mut tight = Vec::with_capacity((tight_pitch * height) as usize);
    for row in 0..height {
        let start = (row * data.row_pitch) as usize;
        tight.extend_from_slice(&data.data[start..start + tight_pitch as usize]);
    }
    write_to_file(filename, width as u64, height as u64, 4, &tight)
}

/// Loads an image from file and creates a shader resource for it on the device heap.
#[cfg(target_os = "windows")]
pub fn load_texture_from_file(
    device: &mut crate::gfx::Device,
    file: &str,
) -> Result<crate::gfx::Texture, super::Error> {
    let image = load_from_file(file)?;
    device.create_texture(
        &crate::gfx::TextureInfo::shader_resource_from_image(&image.info),
        Some(&image.data),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> String {
        let path = std::env::temp_dir().join(name);
        String::from(path.to_str().unwrap())
    }

    #[test]
    fn png_write_load_round_trip() {
        let width = 8u64;
        let height = 4u64;
        let mut data = Vec::new();
        for i in 0..width * height {
            data.extend_from_slice(&[(i % 255) as u8, 0x40, 0x80, 0xff]);
        }
        let file = temp_file("dx12_samples_round_trip.png");
        write_to_file(&file, width, height, 4, &data).unwrap();

        let loaded = load_from_file(&file).unwrap();
        assert_eq!(loaded.info.width, width);
        assert_eq!(loaded.info.height, height);
        assert!(!loaded.info.cubemap);
        assert_eq!(loaded.data.len(), (width * height * 4) as usize);
        assert_eq!(&loaded.data[0..4], &data[0..4]);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let result = write_to_file(&temp_file("image.xyz"), 1, 1, 4, &[0, 0, 0, 0]);
        assert!(result.is_err());
    }

    #[test]
    fn dds_cubemap_info() {
        let dds = DDS::new_dxgi(ddsfile::NewDxgiParams {
            height: 16,
            width: 16,
            depth: None,
            format: DxgiFormat::R8G8B8A8_UNorm,
            mipmap_levels: None,
            array_layers: None,
            caps2: Some(
                Caps2::CUBEMAP
                    | Caps2::CUBEMAP_POSITIVEX
                    | Caps2::CUBEMAP_NEGATIVEX
                    | Caps2::CUBEMAP_POSITIVEY
                    | Caps2::CUBEMAP_NEGATIVEY
                    | Caps2::CUBEMAP_POSITIVEZ
                    | Caps2::CUBEMAP_NEGATIVEZ,
            ),
            is_cubemap: true,
            resource_dimension: ddsfile::D3D10ResourceDimension::Texture2D,
            alpha_mode: ddsfile::AlphaMode::Unknown,
        })
        .unwrap();

        let file = temp_file("dx12_samples_cube.dds");
        let mut f = std::fs::File::create(&file).unwrap();
        dds.write(&mut f).unwrap();
        drop(f);

        // the file has no payload data so read the header through ddsfile directly
        let mut f = std::fs::File::open(&file).unwrap();
        let parsed = DDS::read(&mut f).unwrap();
        assert!(is_dds_cubemap(&parsed));
        assert_eq!(parsed.get_num_array_layers(), 6);
        assert!(validate_dds_format(&parsed, &file).is_ok());
    }
}
