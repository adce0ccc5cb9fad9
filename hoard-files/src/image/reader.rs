use std::io::Read;

use crate::LoadError;
use crate::codec::reader::{
    ChunkTarget, Parseable, ReadSeek, eat_chunk, eat_record_tail, read_chunk_header, read_common_chunk, read_payload,
    skip_unknown_chunk,
};
use crate::codec::types::gid;
use crate::file::context::{ChunkEnv, LoadContext};
use crate::file::source::Deferred;
use crate::image::types::{ColorMode, Image, ImageProps, check_pixel_count};
use crate::node::tree::NodeId;
use crate::node::types::{NodeHeader, Resource};

pub fn load_image(ctx: &mut LoadContext, rdr: &mut dyn ReadSeek, size: u32) -> Result<NodeId, LoadError> {
    let mut header = NodeHeader::default();
    let mut image = Image::default();
    let entrypoint = rdr.stream_position()?;

    image.read(rdr, size, &mut header, ctx.env(), false)?;
    image.deferred = Some(Deferred::new(entrypoint, ctx.file_link()));
    if !image.is_loaded() {
        ctx.keep_open();
    }

    Ok(ctx.insert(header, Resource::Image(image)))
}

impl Image {
    pub(crate) fn read(
        &mut self,
        rdr: &mut dyn ReadSeek,
        size: u32,
        header: &mut NodeHeader,
        env: &ChunkEnv,
        force: bool,
    ) -> Result<(), LoadError> {
        let target = ChunkTarget::new(rdr, size)?;
        let mut load = true;

        while !target.reached(rdr)? {
            let chunk = read_chunk_header(rdr)?;
            match chunk.gid {
                gid::IMAGE_PROPS => {
                    let props = ImageProps::parse(rdr)?;
                    eat_record_tail::<ImageProps, _>(rdr, chunk.size)?;

                    let (Ok(width), Ok(height)) = (u32::try_from(props.width), u32::try_from(props.height)) else {
                        return Err(LoadError::FormatError {
                            reason: "image dimensions are negative",
                        });
                    };
                    self.width = width;
                    self.height = height;
                    self.mode = ColorMode::try_from(props.mode).map_err(|_| LoadError::FormatError {
                        reason: "unknown image color mode",
                    })?;
                    self.compression = props.compression;
                    load = force || !bool::from(props.lazy);
                }
                gid::IMAGE_CMP_PROPS => {
                    // newer files carry at most the compression tag here
                    if chunk.size > 4 {
                        return Err(LoadError::FormatError {
                            reason: "image compression properties of an old version",
                        });
                    }
                    eat_chunk(rdr, u64::from(chunk.size))?;
                }
                gid::IMAGE_DATA if load => {
                    let data = read_payload(rdr, chunk.size)?;
                    check_pixel_count(self.width, self.height, self.mode, data.len())?;
                    self.data = Some(data);
                }
                gid::IMAGE_CMP_DATA if load => {
                    if self.compression == gid::NONE {
                        return Err(LoadError::FormatError {
                            reason: "compressed image data without a compression tag",
                        });
                    }
                    if self.compression != gid::LZMA {
                        return Err(LoadError::UnsupportedCompression { gid: self.compression });
                    }

                    let payload = ChunkTarget::new(rdr, chunk.size)?;
                    let mut data = Vec::new();
                    env.compressor
                        .decode(&mut Read::take(&mut *rdr, u64::from(chunk.size)), &mut data)?;
                    payload.skip_to_end(rdr)?;
                    check_pixel_count(self.width, self.height, self.mode, data.len())?;
                    self.data = Some(data);
                }
                gid::IMAGE_DATA | gid::IMAGE_CMP_DATA => eat_chunk(rdr, u64::from(chunk.size))?,
                _ => {
                    if !read_common_chunk(rdr, header, chunk.gid, chunk.size)? {
                        skip_unknown_chunk(rdr, chunk, env.options.strict_chunks)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Fetches the pixels of a lazy or discarded image from its file.
    pub fn load(&mut self) -> Result<(), LoadError> {
        if self.is_loaded() {
            return Ok(());
        }

        let deferred = self.deferred.clone().ok_or(LoadError::NoFileObject)?;
        deferred.reopen(|rdr, size, env| {
            let mut header = NodeHeader::default();
            self.read(rdr, size, &mut header, env, true)
        })?;

        if self.is_loaded() {
            Ok(())
        } else {
            Err(LoadError::FormatError {
                reason: "the image has no pixel data",
            })
        }
    }
}
