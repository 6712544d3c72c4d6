use ds_core::streams::{
    read_exact, read_until_end, Endian, FileMode, FileStream, SeekOrigin, Stream, Swap,
};

#[test]
fn file_stream_round_trips_through_seek() {
    let path = std::env::temp_dir().join(format!(
        "ds_core_stream_test_{}_{}",
        std::process::id(),
        "round_trip"
    ));
    {
        let mut stream = FileStream::open(&path, FileMode::Write).unwrap();
        stream.write(b"deepsea").unwrap();
    }
    let mut stream = FileStream::open(&path, FileMode::Read).unwrap();
    let mut buf = [0u8; 7];
    read_exact(&mut stream, &mut buf).unwrap();
    assert_eq!(&buf, b"deepsea");

    stream.seek(0, SeekOrigin::Begin).unwrap();
    let mut first_three = [0u8; 3];
    read_exact(&mut stream, &mut first_three).unwrap();
    assert_eq!(&first_three, b"dee");

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn read_until_end_reads_the_rest_of_a_file_stream() {
    let path = std::env::temp_dir().join(format!(
        "ds_core_stream_test_{}_{}",
        std::process::id(),
        "read_until_end"
    ));
    {
        let mut stream = FileStream::open(&path, FileMode::Write).unwrap();
        stream.write(b"deepsea engine").unwrap();
    }

    let mut stream = FileStream::open(&path, FileMode::Read).unwrap();
    let mut skip = [0u8; 8];
    read_exact(&mut stream, &mut skip).unwrap();

    let mut buf = Vec::new();
    let n = read_until_end(&mut stream, &mut buf).unwrap();
    assert_eq!(n, "engine".len());
    assert_eq!(&buf, b"engine");

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn restarting_a_file_stream_reads_from_the_beginning_again() {
    let path = std::env::temp_dir().join(format!(
        "ds_core_stream_test_{}_{}",
        std::process::id(),
        "restart"
    ));
    {
        let mut stream = FileStream::open(&path, FileMode::Write).unwrap();
        stream.write(b"deepsea").unwrap();
    }

    let mut stream = FileStream::open(&path, FileMode::Read).unwrap();
    assert!(stream.is_restartable());
    let mut first = [0u8; 3];
    read_exact(&mut stream, &mut first).unwrap();
    assert_eq!(&first, b"dee");

    stream.restart().unwrap();
    let mut second = [0u8; 3];
    read_exact(&mut stream, &mut second).unwrap();
    assert_eq!(&second, b"dee");

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn endian_swap_round_trips_a_u32() {
    let value: u32 = 0xDEAD_BEEF;
    let foreign = Endian::Little;
    let to_foreign = value.to_endian(foreign);
    let back = to_foreign.from_endian(foreign);
    assert_eq!(back, value);
}
