use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use googly::FrameFeed;
use ogle::FrameSource;

fn data_url(width: u32, height: u32) -> String {
    let img = image::GrayImage::from_pixel(width, height, image::Luma([200u8]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", BASE64.encode(&bytes))
}

#[test]
fn starts_without_a_frame() {
    let feed = FrameFeed::new();
    assert!(!feed.has_frame());
    assert!(feed.latest().is_none());
}

#[test]
fn decodes_a_frame_into_luma_pixels() {
    let feed = FrameFeed::new();
    feed.push_data_url(&data_url(4, 3)).unwrap();
    let frame = feed.latest().unwrap();
    assert_eq!((frame.width, frame.height), (4, 3));
    assert_eq!(frame.luma.len(), 12);
}

#[test]
fn newest_frame_wins() {
    let feed = FrameFeed::new();
    feed.push_data_url(&data_url(4, 3)).unwrap();
    feed.push_data_url(&data_url(8, 6)).unwrap();
    assert_eq!(feed.latest().unwrap().width, 8);
}

#[test]
fn rejects_non_image_payloads() {
    let feed = FrameFeed::new();
    assert!(feed.push_data_url("data:text/plain;base64,aGk=").is_err());
    assert!(!feed.has_frame());
}

#[test]
fn rejects_broken_base64() {
    let feed = FrameFeed::new();
    assert!(feed.push_data_url("data:image/png;base64,@@@").is_err());
}

#[test]
fn rejects_undecodable_image_bytes() {
    let feed = FrameFeed::new();
    let url = format!("data:image/png;base64,{}", BASE64.encode(b"not a png"));
    assert!(feed.push_data_url(&url).is_err());
}
