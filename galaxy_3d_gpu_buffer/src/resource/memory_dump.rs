/// Memory dump sink for GPU resource accounting

/// Receives per-resource memory statistics
pub trait TraceMemoryDump {
    fn dump_numeric_value(&mut self, dump_name: &str, value_name: &str, units: &str, value: u64);

    fn dump_string_value(&mut self, _dump_name: &str, _value_name: &str, _value: &str) {}

    /// Link a dump to the native object that backs it
    fn set_memory_backing(&mut self, dump_name: &str, backing_type: &str, backing_object_id: &str);
}
